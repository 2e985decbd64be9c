//! HTTP Handlers
//!
//! Each handler owns a request-scoped [`CookieRegistry`]; commands
//! queued by the use case are written onto the response headers just
//! before the response leaves the handler.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use kernel::id::SessionId;
use platform::client::DeviceInfo;
use platform::cookie::{CookieRegistry, extract_cookie, write_cookies};
use uuid::Uuid;

use crate::application::config::{AuthConfig, REFRESH_COOKIE};
use crate::application::email_otp::EmailOtpUseCase;
use crate::application::refresh::RefreshUseCase;
use crate::application::session_manager::SessionManager;
use crate::application::sign_in::SignInUseCase;
use crate::application::sign_out::SignOutUseCase;
use crate::application::tokens::TokenService;
use crate::application::totp_setup::TotpSetupUseCase;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    EmailConfirmRequest, EmailVerifyRequest, LoginRequest, LoginResponse, LogoutAllResponse,
    RefreshRequest, RefreshResponse, SessionView, TotpConfirmRequest, TotpSetupResponse,
};
use crate::presentation::middleware::AuthContext;
use crate::presentation::{AuthRepo, MailPort};

/// Shared handler state
#[derive(Clone)]
pub struct AuthAppState<R, M> {
    pub repo: R,
    pub mailer: M,
    pub tokens: TokenService,
    pub config: AuthConfig,
}

impl<R: AuthRepo, M: MailPort> AuthAppState<R, M> {
    fn session_manager(&self) -> SessionManager<R, R> {
        SessionManager::new(self.repo.clone(), self.repo.clone())
    }

    fn sign_in(&self) -> SignInUseCase<R, R, R> {
        SignInUseCase::new(
            self.repo.clone(),
            self.session_manager(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn refresh(&self) -> RefreshUseCase<R, R, R> {
        RefreshUseCase::new(
            self.repo.clone(),
            self.session_manager(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn sign_out(&self) -> SignOutUseCase<R, R> {
        SignOutUseCase::new(self.session_manager(), self.config.clone())
    }

    fn email_otp(&self) -> EmailOtpUseCase<R, R, M> {
        EmailOtpUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn totp_setup(&self) -> TotpSetupUseCase<R, R> {
        TotpSetupUseCase::new(self.repo.clone(), self.repo.clone())
    }
}

/// Attach queued cookies to an otherwise-finished response
fn with_cookies(mut registry: CookieRegistry, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    write_cookies(&mut registry, response.headers_mut());
    response
}

/// POST /login
pub async fn login<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<Response> {
    payload.validate()?;

    let device = DeviceInfo::from_request(&headers, "unknown");
    let mut registry = CookieRegistry::new();
    let output = state
        .sign_in()
        .execute(&payload.email, &payload.password, Some(device), &mut registry)
        .await?;

    let body = Json(LoginResponse {
        access_token: output.access_token,
        session_id: output.session_id,
    });
    Ok(with_cookies(registry, body))
}

/// POST /refresh
pub async fn refresh<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> AuthResult<Response> {
    let token = extract_cookie(&headers, REFRESH_COOKIE)
        .or_else(|| payload.and_then(|Json(p)| p.refresh_token))
        .ok_or(AuthError::InvalidToken)?;

    let mut registry = CookieRegistry::new();
    let output = state.refresh().execute(&token, &mut registry).await?;

    let body = Json(RefreshResponse {
        access_token: output.access_token,
    });
    Ok(with_cookies(registry, body))
}

/// GET /sessions
pub async fn list_sessions<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
) -> AuthResult<Json<Vec<SessionView>>> {
    let sessions = state
        .session_manager()
        .list_sessions(&context.user_id)
        .await?;
    let views = sessions
        .into_iter()
        .map(|s| SessionView::from_session(s, &context.session_id))
        .collect();
    Ok(Json(views))
}

/// POST /sessions/revoke/{id}
pub async fn revoke_session<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> AuthResult<StatusCode> {
    state
        .session_manager()
        .revoke_session(&context.user_id, &SessionId::from_uuid(id))
        .await?;
    Ok(StatusCode::OK)
}

/// POST /logout
pub async fn logout<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
) -> AuthResult<Response> {
    let mut registry = CookieRegistry::new();
    state
        .sign_out()
        .logout(&context.user_id, &context.session_id, &mut registry)
        .await?;
    Ok(with_cookies(registry, StatusCode::NO_CONTENT))
}

/// POST /logout/all
pub async fn logout_all<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
) -> AuthResult<Response> {
    let mut registry = CookieRegistry::new();
    let revoked = state
        .sign_out()
        .logout_all(&context.user_id, &mut registry)
        .await?;
    Ok(with_cookies(registry, Json(LogoutAllResponse { revoked })))
}

/// POST /email/verify/request
pub async fn email_verify_request<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Json(payload): Json<EmailVerifyRequest>,
) -> AuthResult<StatusCode> {
    payload.validate()?;
    state.email_otp().request(&payload.email).await?;
    // Accepted regardless of whether the address has an account
    Ok(StatusCode::ACCEPTED)
}

/// POST /email/verify/confirm
pub async fn email_verify_confirm<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Json(payload): Json<EmailConfirmRequest>,
) -> AuthResult<StatusCode> {
    payload.validate()?;
    state
        .email_otp()
        .verify(&payload.email, &payload.code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /totp/setup
pub async fn totp_setup<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
) -> AuthResult<Json<TotpSetupResponse>> {
    let output = state.totp_setup().setup(&context.user_id).await?;
    Ok(Json(TotpSetupResponse {
        secret: output.secret,
        provisioning_uri: output.provisioning_uri,
    }))
}

/// POST /totp/confirm
pub async fn totp_confirm<R: AuthRepo, M: MailPort>(
    State(state): State<AuthAppState<R, M>>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<TotpConfirmRequest>,
) -> AuthResult<StatusCode> {
    payload.validate()?;
    state
        .totp_setup()
        .confirm(&context.user_id, &payload.code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
