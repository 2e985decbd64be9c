//! Application Layer - Use Cases

pub mod config;
pub mod email_otp;
pub mod refresh;
pub mod session_manager;
pub mod sign_in;
pub mod sign_out;
pub mod tokens;
pub mod totp_setup;

use platform::cookie::CookieRegistry;

use config::{ACCESS_COOKIE, AuthConfig, CSRF_COOKIE, REFRESH_COOKIE};

/// Queue the full auth cookie trio on the response
pub(crate) fn queue_auth_cookies(
    registry: &mut CookieRegistry,
    config: &AuthConfig,
    access_jwt: &str,
    refresh_jwt: &str,
    csrf_token: &str,
) {
    registry.set(ACCESS_COOKIE, access_jwt, config.access_cookie_options());
    registry.set(REFRESH_COOKIE, refresh_jwt, config.refresh_cookie_options());
    registry.set(CSRF_COOKIE, csrf_token, config.csrf_cookie_options());
}

/// Queue clears for the full auth cookie trio
///
/// Clear options must repeat the original Path scoping or browsers
/// treat them as different cookies and keep the originals.
pub(crate) fn queue_auth_cookie_clears(registry: &mut CookieRegistry, config: &AuthConfig) {
    registry.clear(ACCESS_COOKIE, config.access_cookie_options());
    registry.clear(REFRESH_COOKIE, config.refresh_cookie_options());
    registry.clear(CSRF_COOKIE, config.csrf_cookie_options());
}
