use std::path::{Path, PathBuf};

use thiserror::Error;

/// Classified failures of the account store.
///
/// Filesystem errors never leak raw; they are wrapped with the operation that failed so the
/// HTTP layer can map kinds without inspecting messages.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("store i/o error while trying to {context}: {source}")]
    StoreIo {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record at {}: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },
    #[error("credential hashing failed: {0}")]
    Hashing(String),
}

impl AccountError {
    pub fn not_found(entity: &str, name: &str) -> Self { Self::NotFound(format!("{entity} {name}")) }

    pub fn already_exists(entity: &str, name: &str) -> Self { Self::AlreadyExists(format!("{entity} {name}")) }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreIo { context: context.into(), source }
    }

    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::CorruptRecord { path: path.to_path_buf(), reason: reason.into() }
    }

    /// True for kinds caused by the caller's input rather than the store's state.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidName(_) | Self::AlreadyExists(_) | Self::NotFound(_))
    }
}
