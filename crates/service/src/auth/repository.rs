use async_trait::async_trait;

use super::domain::AdminRecord;
use super::errors::AuthError;

/// Source of the administrator credential record.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// `Ok(None)` when no administrator has been configured.
    async fn load(&self) -> Result<Option<AdminRecord>, AuthError>;
}

/// Simple in-memory repository for tests and doc examples
pub mod mock {
    use super::*;

    #[derive(Default)]
    pub struct StaticAdminRepository {
        record: Option<AdminRecord>,
    }

    impl StaticAdminRepository {
        pub fn new(record: AdminRecord) -> Self { Self { record: Some(record) } }
    }

    #[async_trait]
    impl AdminRepository for StaticAdminRepository {
        async fn load(&self) -> Result<Option<AdminRecord>, AuthError> {
            Ok(self.record.clone())
        }
    }
}
