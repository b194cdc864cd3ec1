//! Environment/runtime helpers
//!
//! Sanity checks to ensure the store root is usable at startup.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("cannot create store root {path}: {source}")]
    Create { path: String, source: std::io::Error },
    #[error("store root {path} is not readable: {source}")]
    Unreadable { path: String, source: std::io::Error },
    #[error("store root {0} exists but is not a directory")]
    NotADirectory(String),
}

/// Ensure the store root exists and can be listed.
///
/// A missing root is created; a root that exists but cannot be read is fatal.
pub async fn ensure_store_root(root: &Path) -> Result<(), EnvError> {
    let shown = root.display().to_string();
    match tokio::fs::metadata(root).await {
        Ok(meta) if !meta.is_dir() => return Err(EnvError::NotADirectory(shown)),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(root = %shown, "store root missing; creating it");
            tokio::fs::create_dir_all(root)
                .await
                .map_err(|source| EnvError::Create { path: shown.clone(), source })?;
        }
        Err(source) => return Err(EnvError::Unreadable { path: shown, source }),
    }

    let _listing = tokio::fs::read_dir(root)
        .await
        .map_err(|source| EnvError::Unreadable { path: shown.clone(), source })?;
    info!(root = %shown, "store root ready");
    Ok(())
}
