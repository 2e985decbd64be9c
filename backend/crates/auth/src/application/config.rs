//! Application Configuration

use std::time::Duration;

use platform::cookie::{CookieOptions, SameSite};

/// Access token cookie (HttpOnly, Path=/)
pub const ACCESS_COOKIE: &str = "bsaas_at";
/// Refresh token cookie (HttpOnly, path-scoped to the refresh route)
pub const REFRESH_COOKIE: &str = "bsaas_rt";
/// CSRF double-submit cookie (JS-readable)
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header that must echo the CSRF cookie on mutating requests
pub const CSRF_HEADER: &str = "x-xsrf-token";
/// Only path the browser ever sends the refresh cookie to
pub const REFRESH_COOKIE_PATH: &str = "/auth/refresh";

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing (HS256)
    pub jwt_secret: Vec<u8>,
    /// Access token TTL (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token TTL (14 days)
    pub refresh_ttl: Duration,
    /// Email OTP TTL (10 minutes)
    pub otp_ttl: Duration,
    /// Whether to require Secure cookies
    pub cookie_secure: bool,
    /// SameSite policy for all auth cookies
    pub cookie_same_site: SameSite,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(14 * 24 * 3600),
            otp_ttl: Duration::from_secs(10 * 60),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: Vec<u8>) -> Self {
        Self {
            jwt_secret,
            ..Self::default()
        }
    }

    /// Config with a random secret (for development and tests)
    pub fn with_random_secret() -> Self {
        Self::new(platform::crypto::random_bytes(32))
    }

    /// Development config (insecure cookies for plain-HTTP localhost)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn access_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_ttl.as_secs() as i64)
    }

    pub fn refresh_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_ttl.as_secs() as i64)
    }

    pub fn otp_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.otp_ttl.as_secs() as i64)
    }

    /// Options for `bsaas_at`
    pub fn access_cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: Some("/".into()),
            secure: self.cookie_secure,
            http_only: true,
            same_site: Some(self.cookie_same_site),
            max_age_secs: Some(self.access_ttl.as_secs() as i64),
            ..CookieOptions::default()
        }
    }

    /// Options for `bsaas_rt`
    pub fn refresh_cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: Some(REFRESH_COOKIE_PATH.into()),
            secure: self.cookie_secure,
            http_only: true,
            same_site: Some(self.cookie_same_site),
            max_age_secs: Some(self.refresh_ttl.as_secs() as i64),
            ..CookieOptions::default()
        }
    }

    /// Options for `XSRF-TOKEN` (readable by JS, per double-submit)
    pub fn csrf_cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: Some("/".into()),
            secure: self.cookie_secure,
            http_only: false,
            same_site: Some(self.cookie_same_site),
            max_age_secs: Some(self.refresh_ttl.as_secs() as i64),
            ..CookieOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_options_shapes() {
        let config = AuthConfig::with_random_secret();

        let access = config.access_cookie_options();
        assert!(access.http_only);
        assert!(access.secure);
        assert_eq!(access.path.as_deref(), Some("/"));

        let refresh = config.refresh_cookie_options();
        assert!(refresh.http_only);
        assert_eq!(refresh.path.as_deref(), Some(REFRESH_COOKIE_PATH));

        let csrf = config.csrf_cookie_options();
        assert!(!csrf.http_only);
        assert_eq!(csrf.path.as_deref(), Some("/"));
    }

    #[test]
    fn test_default_ttls() {
        let config = AuthConfig::default();
        assert_eq!(config.access_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_ttl, Duration::from_secs(14 * 24 * 3600));
        assert_eq!(config.otp_ttl, Duration::from_secs(600));
    }
}
