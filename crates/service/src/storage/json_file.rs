use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum JsonFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),
}

impl JsonFileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Read and decode a JSON document.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, JsonFileError> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()))
}

/// Write `value` to a hidden sibling temp file, then rename it over `path`.
///
/// Readers observe either the previous document or the new one, never a partial write.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), JsonFileError> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp = temp_sibling(path);
    if let Err(e) = write_private(&tmp, &data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(unix)]
async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    let mut file = fs::OpenOptions::new().write(true).create_new(true).mode(0o600).open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[cfg(not(unix))]
async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data).await
}
