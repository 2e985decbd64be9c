//! Client Identification
//!
//! Derives coarse device metadata from request headers for session
//! bookkeeping. IP addresses are stored only as SHA-256 digests so
//! session listings never expose raw addresses.

use http::HeaderMap;

use crate::crypto::{sha256, to_base64};

/// Device metadata captured at sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub user_agent: String,
    pub os: String,
    pub ip_hash: String,
}

impl DeviceInfo {
    /// Build from request headers and the transport-level peer address
    pub fn from_request(headers: &HeaderMap, peer_ip: &str) -> Self {
        let user_agent = headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let os = detect_os(&user_agent).to_string();
        let ip = extract_client_ip(headers).unwrap_or_else(|| peer_ip.to_string());
        Self {
            user_agent,
            os,
            ip_hash: hash_ip(&ip),
        }
    }
}

/// Hash an IP address for storage
pub fn hash_ip(ip: &str) -> String {
    to_base64(&sha256(ip.as_bytes()))
}

/// Resolve the client IP, preferring the first `X-Forwarded-For` hop
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Coarse OS classification from a User-Agent string
pub fn detect_os(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("windows") {
        "Windows"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_os() {
        assert_eq!(
            detect_os("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            "Windows"
        );
        assert_eq!(
            detect_os("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)"),
            "macOS"
        );
        assert_eq!(
            detect_os("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"),
            "iOS"
        );
        assert_eq!(detect_os("Mozilla/5.0 (Linux; Android 14)"), "Android");
        assert_eq!(detect_os("Mozilla/5.0 (X11; Linux x86_64)"), "Linux");
        assert_eq!(detect_os("curl/8.0"), "Unknown");
    }

    #[test]
    fn test_extract_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(
            extract_client_ip(&headers),
            Some("203.0.113.7".to_string())
        );
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_ip_hash_stable_and_opaque() {
        let a = hash_ip("203.0.113.7");
        let b = hash_ip("203.0.113.7");
        let c = hash_ip("203.0.113.8");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.contains("203"));
    }

    #[test]
    fn test_device_info_from_request() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::USER_AGENT,
            "Mozilla/5.0 (Windows NT 10.0)".parse().unwrap(),
        );
        let info = DeviceInfo::from_request(&headers, "198.51.100.4");
        assert_eq!(info.os, "Windows");
        assert_eq!(info.ip_hash, hash_ip("198.51.100.4"));
    }
}
