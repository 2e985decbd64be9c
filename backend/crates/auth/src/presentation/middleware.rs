//! Auth Middleware
//!
//! The guard chain for protected routes: JWT identity, CSRF
//! double-submit, role allow-lists, and strong-auth for admins.

use std::future::Future;
use std::pin::Pin;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::{SessionId, UserId};
use platform::cookie::extract_cookie;
use platform::crypto::constant_time_eq;

use crate::application::config::{ACCESS_COOKIE, CSRF_COOKIE, CSRF_HEADER};
use crate::application::tokens::TokenService;
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::role::Role;
use crate::error::AuthError;

/// Identity attached to the request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub roles: Vec<Role>,
}

impl AuthContext {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// State for the token-verifying middleware
#[derive(Clone)]
pub struct AuthMiddlewareState<R> {
    pub repo: R,
    pub tokens: TokenService,
}

/// Require a valid access token (bearer header or cookie fallback)
///
/// On success an [`AuthContext`] is inserted into request extensions
/// for downstream guards and handlers.
pub async fn require_auth<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: Clone + Send + Sync + 'static,
{
    let headers = req.headers();

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer.or_else(|| extract_cookie(headers, ACCESS_COOKIE));

    let Some(token) = token else {
        return Err(AuthError::InvalidToken.into_response());
    };

    let claims = match state.tokens.verify_access(&token) {
        Ok(claims) => claims,
        Err(e) => return Err(e.into_response()),
    };
    let context = match (claims.user_id(), claims.session_id()) {
        (Ok(user_id), Ok(session_id)) => AuthContext {
            user_id,
            session_id,
            roles: claims.roles,
        },
        _ => return Err(AuthError::InvalidToken.into_response()),
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Double-submit CSRF check for state-changing requests
///
/// GET/HEAD/OPTIONS pass untouched. Everything else must carry an
/// `X-XSRF-TOKEN` header equal to the `XSRF-TOKEN` cookie. The
/// comparison is constant-time.
pub async fn csrf_guard(req: Request<Body>, next: Next) -> Result<Response, Response> {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(req).await);
    }

    let headers = req.headers();
    let header_token = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    let cookie_token = extract_cookie(headers, CSRF_COOKIE);

    match (header_token, cookie_token) {
        (Some(header), Some(cookie))
            if constant_time_eq(header.as_bytes(), cookie.as_bytes()) =>
        {
            Ok(next.run(req).await)
        }
        _ => Err(AuthError::CsrfMismatch.into_response()),
    }
}

/// Allow-list guard; runs after [`require_auth`]
///
/// Usage: `.layer(axum::middleware::from_fn(require_roles(&[Role::Admin])))`
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Clone
+ Send
+ Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Result<Response, Response>> + Send>> {
    move |req, next| Box::pin(roles_guard(allowed, req, next))
}

async fn roles_guard(
    allowed: &'static [Role],
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(context) = req.extensions().get::<AuthContext>() else {
        return Err(AuthError::InvalidToken.into_response());
    };
    if !context.roles.iter().any(|r| allowed.contains(r)) {
        return Err(AuthError::Forbidden.into_response());
    }
    Ok(next.run(req).await)
}

/// Step-up enforcement for admin accounts; runs after [`require_auth`]
///
/// Non-admins pass unconditionally. Admins must hold a verified TOTP
/// credential or at least one passkey; otherwise the distinct
/// `StrongAuthRequired` error tells the client to start enrollment
/// instead of showing a generic permission failure.
pub async fn strong_auth_guard<R>(
    State(state): State<AuthMiddlewareState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: CredentialRepository + Clone + Send + Sync + 'static,
{
    let Some(context) = req.extensions().get::<AuthContext>() else {
        return Err(AuthError::InvalidToken.into_response());
    };

    if !context.roles.iter().any(|r| r.requires_strong_auth()) {
        return Ok(next.run(req).await);
    }

    let totp_verified = match state.repo.find_totp_by_user_id(&context.user_id).await {
        Ok(credential) => credential.is_some_and(|c| c.is_verified()),
        Err(e) => return Err(e.into_response()),
    };
    if totp_verified {
        return Ok(next.run(req).await);
    }

    match state.repo.has_passkey(&context.user_id).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err(AuthError::StrongAuthRequired.into_response()),
        Err(e) => Err(e.into_response()),
    }
}
