//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binaries can prepare the store root through `service`.

use std::path::Path;

/// Make sure the account store root exists and is a readable directory.
pub async fn ensure_store_root(root: &Path) -> anyhow::Result<()> {
    common::env::ensure_store_root(root).await?;
    Ok(())
}
