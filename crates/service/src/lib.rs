//! Service layer of the mail account server.
//! - Filesystem-backed account store (domains, users, aliases) behind the `AccountStore` trait.
//! - Administrative authentication with in-memory sessions.
//! - Credential checks for mail front-ends.

pub mod errors;
pub mod accounts;
pub mod admin;
pub mod auth;
pub mod file;
pub mod storage;
pub mod mail_auth;
pub mod pagination;
pub mod runtime;
#[cfg(test)]
pub mod test_support;

pub use admin::AccountStore;
pub use errors::AccountError;
pub use file::{DirectoryStore, StoreLayout};
pub use mail_auth::MailAuthenticator;
