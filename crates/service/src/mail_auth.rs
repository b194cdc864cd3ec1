//! Credential checks for mail protocol front-ends (IMAP/SMTP submission).

use async_trait::async_trait;
use tracing::{error, instrument};

use crate::accounts::validation::parse_address;
use crate::admin::AccountStore;

/// Answers "may this mailbox log in with this password". Every failure is a plain `false`.
#[async_trait]
pub trait MailAuthenticator: Send + Sync {
    async fn authenticate(&self, domain: &str, username: &str, password: &str) -> bool;

    /// Same check for a full `local@domain` login name.
    async fn authenticate_address(&self, address: &str, password: &str) -> bool {
        match parse_address(address) {
            Ok((username, domain)) => self.authenticate(domain, username, password).await,
            Err(_) => false,
        }
    }
}

#[async_trait]
impl<S: AccountStore + ?Sized> MailAuthenticator for S {
    #[instrument(skip(self, password))]
    async fn authenticate(&self, domain: &str, username: &str, password: &str) -> bool {
        match self.verify_credentials(domain, username, password).await {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "credential check failed; denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[tokio::test]
    async fn authenticates_known_mailboxes_only() -> anyhow::Result<()> {
        let (_tmp, store) = temp_store().await?;
        store.create_domain("example.com").await?;
        store.create_user("example.com", "alice", "pw1").await?;

        assert!(store.authenticate("example.com", "alice", "pw1").await);
        assert!(!store.authenticate("example.com", "alice", "pw2").await);
        assert!(!store.authenticate("example.com", "bob", "pw1").await);
        assert!(!store.authenticate("../etc", "alice", "pw1").await);

        assert!(store.authenticate_address("alice@example.com", "pw1").await);
        assert!(!store.authenticate_address("alice", "pw1").await);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_record_denies() -> anyhow::Result<()> {
        let (tmp, store) = temp_store().await?;
        store.create_domain("example.com").await?;
        store.create_user("example.com", "alice", "pw1").await?;
        std::fs::write(tmp.path().join("example.com/alice/account.json"), b"{not json")?;
        assert!(!store.authenticate("example.com", "alice", "pw1").await);
        Ok(())
    }
}
