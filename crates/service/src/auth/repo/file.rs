use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{error, info};

use crate::auth::domain::AdminRecord;
use crate::auth::errors::AuthError;
use crate::auth::repository::AdminRepository;
use crate::storage::json_file::{read_json, write_json_atomic};

/// Reads `admin.json` on every load so edits take effect without a restart.
#[derive(Clone, Debug)]
pub struct FileAdminRepository {
    path: PathBuf,
}

impl FileAdminRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    /// Persist the administrator record, replacing any previous one.
    pub async fn save(&self, record: &AdminRecord) -> Result<(), AuthError> {
        write_json_atomic(&self.path, record)
            .await
            .map_err(|e| AuthError::AdminRecord(e.to_string()))?;
        info!(path = %self.path.display(), username = %record.username, "admin record saved");
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for FileAdminRepository {
    async fn load(&self) -> Result<Option<AdminRecord>, AuthError> {
        match read_json::<AdminRecord>(&self.path).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "cannot read admin record");
                Err(AuthError::AdminRecord(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::CredentialHasher;

    #[tokio::test]
    async fn save_then_load() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let repo = FileAdminRepository::new(tmp.path().join("admin.json"));
        assert!(repo.load().await?.is_none());

        let record = AdminRecord::new("root@example.com", "pw", &CredentialHasher::insecure_fast())?;
        repo.save(&record).await?;
        let loaded = repo.load().await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(loaded.username, "root@example.com");
        assert_eq!(loaded.credential_hash, record.credential_hash);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("admin.json");
        std::fs::write(&path, b"[]")?;
        let err = FileAdminRepository::new(path).load().await.unwrap_err();
        assert!(matches!(err, AuthError::AdminRecord(_)));
        Ok(())
    }
}
