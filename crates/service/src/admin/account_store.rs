use async_trait::async_trait;

use crate::accounts::{Domain, Recipient, User};
use crate::errors::AccountError;

/// Trait abstraction for the mail account store.
///
/// Domains own users; names are validated as mail addresses before any filesystem access.
/// Credential hashes stay behind this boundary: no method returns them.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Names of all present domains.
    async fn list_domains(&self) -> Result<Vec<String>, AccountError>;
    async fn resolve_domain(&self, name: &str) -> Result<Domain, AccountError>;
    async fn create_domain(&self, name: &str) -> Result<Domain, AccountError>;
    /// Deletes every user of the domain, then the domain itself. Stops at the first failing user.
    async fn delete_domain(&self, name: &str) -> Result<(), AccountError>;

    async fn domain_users(&self, domain: &str) -> Result<Vec<User>, AccountError>;
    async fn create_user(&self, domain: &str, username: &str, password: &str) -> Result<User, AccountError>;
    async fn delete_user(&self, domain: &str, username: &str) -> Result<(), AccountError>;

    async fn add_alias(&self, domain: &str, username: &str, alias: &str) -> Result<User, AccountError>;
    async fn remove_alias(&self, domain: &str, username: &str, alias: &str) -> Result<User, AccountError>;

    /// `Ok(true)` only when the user exists and the password matches its stored hash.
    async fn verify_credentials(&self, domain: &str, username: &str, password: &str) -> Result<bool, AccountError>;
    /// Map an inbound address to a mailbox, by username first and then by alias.
    async fn resolve_recipient(&self, address: &str) -> Result<Option<Recipient>, AccountError>;
}
