use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;
use super::password::CredentialHasher;

/// Login input. Accepts the capitalised field names older clients send.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput").field("username", &self.username).field("password", &"<redacted>").finish()
    }
}

/// The single administrator principal, stored outside the account tree.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub username: String,
    pub credential_hash: String,
}

impl AdminRecord {
    pub fn new(username: &str, password: &str, hasher: &CredentialHasher) -> Result<Self, AuthError> {
        let credential_hash = hasher.hash(password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self { username: username.to_string(), credential_hash })
    }
}

impl std::fmt::Debug for AdminRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminRecord").field("username", &self.username).field("credential_hash", &"<redacted>").finish()
    }
}

/// An authenticated administrative session. `token` is the raw bearer secret.
#[derive(Clone)]
pub struct AdminSession {
    /// Non-secret handle used to refer to the session in logs.
    pub session_id: Uuid,
    pub username: String,
    pub token: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AdminSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("session_id", &self.session_id)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
