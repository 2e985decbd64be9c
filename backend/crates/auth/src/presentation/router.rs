//! Auth Router

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::application::tokens::TokenService;
use crate::infra::mailer::TracingMailer;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, csrf_guard, require_auth};
use crate::presentation::{AuthRepo, MailPort};

/// Create the auth router with the PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, TracingMailer, config)
}

/// Create the auth router for any repository/mailer implementation
pub fn auth_router_generic<R: AuthRepo, M: MailPort>(repo: R, mailer: M, config: AuthConfig) -> Router {
    let tokens = TokenService::new(&config);
    let middleware_state = AuthMiddlewareState {
        repo: repo.clone(),
        tokens: tokens.clone(),
    };
    let state = AuthAppState {
        repo,
        mailer,
        tokens,
        config,
    };

    // CSRF runs inside the auth guard; GET routes pass it untouched
    let protected = Router::new()
        .route("/sessions", get(handlers::list_sessions::<R, M>))
        .route(
            "/sessions/revoke/{id}",
            post(handlers::revoke_session::<R, M>),
        )
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/logout/all", post(handlers::logout_all::<R, M>))
        .route("/totp/setup", post(handlers::totp_setup::<R, M>))
        .route("/totp/confirm", post(handlers::totp_confirm::<R, M>))
        .layer(from_fn(csrf_guard))
        .layer(from_fn_with_state(middleware_state, require_auth::<R>));

    Router::new()
        .route("/login", post(handlers::login::<R, M>))
        .route("/refresh", post(handlers::refresh::<R, M>))
        .route(
            "/email/verify/request",
            post(handlers::email_verify_request::<R, M>),
        )
        .route(
            "/email/verify/confirm",
            post(handlers::email_verify_confirm::<R, M>),
        )
        .merge(protected)
        .with_state(state)
}
