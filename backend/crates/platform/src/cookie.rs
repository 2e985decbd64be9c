//! Cookie Command Registry & Writer
//!
//! Request-scoped queue of cookie intents, decoupled from the concrete
//! HTTP transport. Handlers enqueue `set`/`clear` commands during
//! processing; nothing touches the wire until the response is written.
//!
//! The writer renders each command as one `Set-Cookie` header value.
//! Attribute order is fixed: `name=value`, `Path`, `Domain`, `Expires`
//! (forced to the epoch together with `Max-Age=0` when clearing),
//! `Max-Age`, `Secure`, `HttpOnly`, `SameSite`. Each command becomes
//! its own header instance; values are never comma-joined because a
//! comma inside a single `Set-Cookie` corrupts cookie parsing.

use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderValue, header::SET_COOKIE};

/// Epoch timestamp used as the forced `Expires` for clear commands
const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// Attributes attached to a cookie command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age_secs: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// HttpOnly + Secure + SameSite=Lax, scoped to `path`
    pub fn http_only_secure(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..Self::default()
        }
    }

    /// Secure but JS-readable (double-submit CSRF cookie), Path=/
    pub fn readable_secure() -> Self {
        Self {
            path: Some("/".into()),
            secure: true,
            http_only: false,
            same_site: Some(SameSite::Lax),
            ..Self::default()
        }
    }

    pub fn with_max_age_secs(mut self, secs: i64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn with_expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }
}

/// One queued cookie intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieCommand {
    Set {
        name: String,
        value: String,
        options: CookieOptions,
    },
    Clear {
        name: String,
        options: CookieOptions,
    },
}

impl CookieCommand {
    pub fn name(&self) -> &str {
        match self {
            CookieCommand::Set { name, .. } | CookieCommand::Clear { name, .. } => name,
        }
    }

    /// Render this command as a single `Set-Cookie` header value
    pub fn render(&self) -> String {
        let (name, value, options, clearing) = match self {
            CookieCommand::Set {
                name,
                value,
                options,
            } => (name, value.as_str(), options, false),
            CookieCommand::Clear { name, options } => (name, "", options, true),
        };

        let mut out = format!("{name}={value}");
        if let Some(path) = &options.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &options.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if clearing {
            // Clearing forces an epoch expiry and overrides any
            // caller-provided expires/max_age.
            out.push_str("; Expires=");
            out.push_str(EPOCH_HTTP_DATE);
            out.push_str("; Max-Age=0");
        } else {
            if let Some(expires) = options.expires {
                out.push_str("; Expires=");
                out.push_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
            }
            if let Some(max_age) = options.max_age_secs {
                out.push_str("; Max-Age=");
                out.push_str(&max_age.to_string());
            }
        }
        if options.secure {
            out.push_str("; Secure");
        }
        if options.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = options.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

/// Request-scoped cookie command queue
///
/// One instance per inbound request; discarded after the response is
/// written. A later command for the same cookie name replaces the
/// earlier one.
#[derive(Debug, Default)]
pub struct CookieRegistry {
    commands: Vec<CookieCommand>,
}

impl CookieRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a set command
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>, options: CookieOptions) {
        self.push(CookieCommand::Set {
            name: name.into(),
            value: value.into(),
            options,
        });
    }

    /// Queue a clear command
    pub fn clear(&mut self, name: impl Into<String>, options: CookieOptions) {
        self.push(CookieCommand::Clear {
            name: name.into(),
            options,
        });
    }

    fn push(&mut self, command: CookieCommand) {
        self.commands.retain(|c| c.name() != command.name());
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[CookieCommand] {
        &self.commands
    }

    /// Drain all queued commands in insertion order
    pub fn take_commands(&mut self) -> Vec<CookieCommand> {
        std::mem::take(&mut self.commands)
    }
}

/// Narrow transport seam for writing response headers
///
/// The writer only needs append-style multi-value header support, so
/// this stays implementable for any HTTP stack.
pub trait HeaderSink {
    fn set_header(&mut self, name: &'static str, values: Vec<String>);
}

impl HeaderSink for HeaderMap {
    fn set_header(&mut self, name: &'static str, values: Vec<String>) {
        debug_assert_eq!(name, SET_COOKIE.as_str());
        for value in values {
            if let Ok(header_value) = HeaderValue::from_str(&value) {
                self.append(SET_COOKIE, header_value);
            }
        }
    }
}

/// Drain the registry into `Set-Cookie` headers on the sink
pub fn write_cookies(registry: &mut CookieRegistry, sink: &mut impl HeaderSink) {
    let commands = registry.take_commands();
    if commands.is_empty() {
        return;
    }
    let values = commands.iter().map(CookieCommand::render).collect();
    sink.set_header("set-cookie", values);
}

/// Extract a cookie value by name from the request `Cookie` header(s)
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| cookie_from_header(header, name))
}

fn cookie_from_header(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_attribute_order() {
        let command = CookieCommand::Set {
            name: "token".into(),
            value: "abc".into(),
            options: CookieOptions {
                path: Some("/".into()),
                domain: Some("example.com".into()),
                expires: Some(Utc.with_ymd_and_hms(2031, 1, 2, 3, 4, 5).unwrap()),
                max_age_secs: Some(3600),
                secure: true,
                http_only: true,
                same_site: Some(SameSite::Strict),
            },
        };
        assert_eq!(
            command.render(),
            "token=abc; Path=/; Domain=example.com; \
             Expires=Thu, 02 Jan 2031 03:04:05 GMT; Max-Age=3600; \
             Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_render_minimal() {
        let command = CookieCommand::Set {
            name: "a".into(),
            value: "b".into(),
            options: CookieOptions::default(),
        };
        assert_eq!(command.render(), "a=b");
    }

    #[test]
    fn test_clear_forces_epoch_and_max_age_zero() {
        // Caller-provided expiry must be ignored when clearing
        let command = CookieCommand::Clear {
            name: "token".into(),
            options: CookieOptions {
                path: Some("/auth/refresh".into()),
                expires: Some(Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap()),
                max_age_secs: Some(3600),
                secure: true,
                http_only: true,
                same_site: Some(SameSite::Lax),
                ..CookieOptions::default()
            },
        };
        assert_eq!(
            command.render(),
            "token=; Path=/auth/refresh; \
             Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; \
             Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_same_site_capitalization() {
        for (variant, expected) in [
            (SameSite::Lax, "a=b; SameSite=Lax"),
            (SameSite::Strict, "a=b; SameSite=Strict"),
            (SameSite::None, "a=b; SameSite=None"),
        ] {
            let command = CookieCommand::Set {
                name: "a".into(),
                value: "b".into(),
                options: CookieOptions {
                    same_site: Some(variant),
                    ..CookieOptions::default()
                },
            };
            assert_eq!(command.render(), expected);
        }
    }

    #[test]
    fn test_registry_last_command_wins_per_name() {
        let mut registry = CookieRegistry::new();
        registry.set("a", "1", CookieOptions::default());
        registry.set("b", "2", CookieOptions::default());
        registry.clear("a", CookieOptions::default());

        let commands = registry.take_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name(), "b");
        assert!(matches!(commands[1], CookieCommand::Clear { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_write_cookies_appends_separate_headers() {
        let mut registry = CookieRegistry::new();
        registry.set("a", "1", CookieOptions::default());
        registry.set("b", "2", CookieOptions::default());

        let mut headers = HeaderMap::new();
        write_cookies(&mut registry, &mut headers);

        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "a=1");
        assert_eq!(values[1], "b=2");
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            "XSRF-TOKEN=abc123; bsaas_at=jwt.token.here; other=x"
                .parse()
                .unwrap(),
        );
        assert_eq!(
            extract_cookie(&headers, "XSRF-TOKEN").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_cookie(&headers, "bsaas_at").as_deref(),
            Some("jwt.token.here")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
        assert_eq!(extract_cookie(&headers, "bsaas"), None);
    }
}
