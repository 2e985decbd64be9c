//! Session Entity
//!
//! One row per signed-in device. Session existence is the source of
//! truth for refresh-token validity: revoking the session strands any
//! outstanding refresh token even before it expires.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use platform::client::DeviceInfo;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub device_ua: Option<String>,
    pub device_os: Option<String>,
    pub ip_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Open a new session at sign-in
    pub fn open(user_id: UserId, device: Option<DeviceInfo>) -> Self {
        let now = Utc::now();
        let (device_ua, device_os, ip_hash) = match device {
            Some(d) => (Some(d.user_agent), Some(d.os), Some(d.ip_hash)),
            None => (None, None, None),
        };
        Self {
            id: SessionId::new(),
            user_id,
            device_ua,
            device_os,
            ip_hash,
            created_at: now,
            last_seen_at: now,
            revoked_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }

    /// Record activity (refresh, authenticated request)
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_seen_at = at;
    }

    /// Revoke; idempotent
    pub fn revoke(&mut self, at: DateTime<Utc>) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(at);
        }
    }
}
