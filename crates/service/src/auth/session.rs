use std::time::Duration;

use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::domain::AdminSession;

/// Length in bytes of a raw session token.
pub const TOKEN_LEN: usize = 256;

/// In-memory registry of live administrative sessions. Sessions do not survive a restart.
pub struct SessionManager {
    sessions: RwLock<Vec<AdminSession>>,
    ttl: Option<Duration>,
}

impl SessionManager {
    /// `ttl = None` keeps sessions valid until logout or restart.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { sessions: RwLock::new(Vec::new()), ttl }
    }

    pub async fn issue(&self, username: &str) -> AdminSession {
        let mut token = vec![0u8; TOKEN_LEN];
        OsRng.fill_bytes(&mut token);

        let now = Utc::now();
        let expires_at = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| now.checked_add_signed(ttl));
        let session = AdminSession {
            session_id: Uuid::new_v4(),
            username: username.to_string(),
            token,
            created_at: now,
            expires_at,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|s| !s.is_expired_at(now));
        sessions.push(session.clone());
        session
    }

    /// Look up the session owning `token`.
    ///
    /// Every stored token is compared in constant time, and the scan never stops early.
    pub async fn validate(&self, token: &[u8]) -> Option<AdminSession> {
        let now = Utc::now();
        let matched = {
            let sessions = self.sessions.read().await;
            let mut matched = None;
            for session in sessions.iter() {
                let equal: bool = session.token.as_slice().ct_eq(token).into();
                if equal && matched.is_none() {
                    matched = Some(session.clone());
                }
            }
            matched
        }?;

        if matched.is_expired_at(now) {
            debug!(session_id = %matched.session_id, "session expired");
            self.sessions.write().await.retain(|s| s.session_id != matched.session_id);
            return None;
        }
        Some(matched)
    }

    /// Drop the session owning `token`. Returns whether one was removed.
    pub async fn revoke(&self, token: &[u8]) -> bool {
        let Some(session) = self.validate(token).await else { return false };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.session_id != session.session_id);
        sessions.len() != before
    }

    pub async fn active(&self) -> usize {
        let now = Utc::now();
        self.sessions.read().await.iter().filter(|s| !s.is_expired_at(now)).count()
    }
}
