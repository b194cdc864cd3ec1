//! Filesystem-backed store implementations.
pub mod credential_cache;
pub mod directory_store;

pub use directory_store::{DirectoryStore, StoreLayout};
