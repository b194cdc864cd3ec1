#![cfg(test)]
use std::sync::Arc;

use tempfile::TempDir;

use crate::auth::password::CredentialHasher;
use crate::file::{DirectoryStore, StoreLayout};

/// A store rooted in a fresh temp directory, hashing with minimal Argon2 costs.
/// Keep the `TempDir` alive for as long as the store is used.
pub async fn temp_store() -> Result<(TempDir, Arc<DirectoryStore>), anyhow::Error> {
    let tmp = tempfile::tempdir()?;
    let store = DirectoryStore::open(tmp.path(), StoreLayout::default(), CredentialHasher::insecure_fast()).await?;
    Ok((tmp, store))
}
