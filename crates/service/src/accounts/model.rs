use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mail domain as seen by callers of the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    /// Taken from the domain manifest; `None` when the manifest is absent.
    pub created_at: Option<DateTime<Utc>>,
}

/// Public view of an account. Carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub aliases: Vec<String>,
}

/// The mailbox an inbound address routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub domain: String,
    pub username: String,
}

/// On-disk record stored at `<root>/<domain>/<username>/<record-file>`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRecord {
    pub username: String,
    pub credential_hash: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl UserRecord {
    pub fn to_user(&self) -> User {
        User { username: self.username.clone(), aliases: self.aliases.clone() }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("credential_hash", &"<redacted>")
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Optional per-domain metadata stored at `<root>/<domain>/<manifest-file>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DomainManifest {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_debug_redacts_hash() {
        let rec = UserRecord { username: "alice".into(), credential_hash: "$argon2id$secret".into(), aliases: vec![] };
        let dbg = format!("{rec:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("alice"));
    }

    #[test]
    fn user_view_has_no_hash_field() -> Result<(), serde_json::Error> {
        let rec = UserRecord { username: "alice".into(), credential_hash: "h".into(), aliases: vec!["a@x.io".into()] };
        let json = serde_json::to_value(rec.to_user())?;
        assert_eq!(json, serde_json::json!({"username": "alice", "aliases": ["a@x.io"]}));
        Ok(())
    }

    #[test]
    fn record_uses_stable_field_names() -> Result<(), serde_json::Error> {
        let rec: UserRecord = serde_json::from_str(r#"{"username":"bob","credentialHash":"h"}"#)?;
        assert!(rec.aliases.is_empty());
        let json = serde_json::to_value(&rec)?;
        assert!(json.get("credentialHash").is_some());
        Ok(())
    }
}
