//! Domain Layer
//!
//! Entities, value objects, and repository ports. No framework or
//! persistence details live here.

pub mod entity;
pub mod repository;
pub mod value_object;
