//! Infrastructure Layer - Repository Adapters

pub mod mailer;
pub mod memory;
pub mod postgres;
