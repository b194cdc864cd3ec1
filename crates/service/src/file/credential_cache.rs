use std::collections::HashMap;
use std::time::SystemTime;

use tokio::sync::RwLock;

use crate::accounts::model::UserRecord;

/// File identity used to decide whether a cached record still matches the disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub modified: SystemTime,
    pub len: u64,
}

impl Stamp {
    pub fn of(meta: &std::fs::Metadata) -> Option<Self> {
        meta.modified().ok().map(|modified| Self { modified, len: meta.len() })
    }
}

/// Lookaside cache of user records keyed by `(domain, username)`.
///
/// The directory tree stays authoritative: callers re-stat the record file and only use an
/// entry whose stamp is unchanged.
#[derive(Default)]
pub(crate) struct CredentialCache {
    entries: RwLock<HashMap<(String, String), (Stamp, UserRecord)>>,
}

impl CredentialCache {
    pub async fn get(&self, domain: &str, username: &str, stamp: Stamp) -> Option<UserRecord> {
        let map = self.entries.read().await;
        map.get(&(domain.to_string(), username.to_string()))
            .filter(|(cached, _)| *cached == stamp)
            .map(|(_, rec)| rec.clone())
    }

    pub async fn insert(&self, domain: &str, username: &str, stamp: Stamp, record: UserRecord) {
        let mut map = self.entries.write().await;
        map.insert((domain.to_string(), username.to_string()), (stamp, record));
    }

    pub async fn invalidate(&self, domain: &str, username: &str) {
        let mut map = self.entries.write().await;
        map.remove(&(domain.to_string(), username.to_string()));
    }

    pub async fn invalidate_domain(&self, domain: &str) {
        let mut map = self.entries.write().await;
        map.retain(|(d, _), _| d != domain);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(name: &str) -> UserRecord {
        UserRecord { username: name.into(), credential_hash: "h".into(), aliases: vec![] }
    }

    #[tokio::test]
    async fn hit_requires_matching_stamp() {
        let cache = CredentialCache::default();
        let stamp = Stamp { modified: SystemTime::UNIX_EPOCH, len: 10 };
        cache.insert("a.com", "bob", stamp, record("bob")).await;

        assert!(cache.get("a.com", "bob", stamp).await.is_some());
        let newer = Stamp { modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1), len: 10 };
        assert!(cache.get("a.com", "bob", newer).await.is_none());
        let longer = Stamp { len: 11, ..stamp };
        assert!(cache.get("a.com", "bob", longer).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_domain_only_drops_that_domain() {
        let cache = CredentialCache::default();
        let stamp = Stamp { modified: SystemTime::UNIX_EPOCH, len: 1 };
        cache.insert("a.com", "bob", stamp, record("bob")).await;
        cache.insert("a.com", "eve", stamp, record("eve")).await;
        cache.insert("b.com", "bob", stamp, record("bob")).await;

        cache.invalidate_domain("a.com").await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("b.com", "bob", stamp).await.is_some());

        cache.invalidate("b.com", "bob").await;
        assert_eq!(cache.len().await, 0);
    }
}
