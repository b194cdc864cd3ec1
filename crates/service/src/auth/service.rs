use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

use super::domain::{AdminSession, LoginInput};
use super::errors::AuthError;
use super::password::CredentialHasher;
use super::repository::AdminRepository;
use super::session::SessionManager;

/// Administrative login and session checks, independent of the web framework
pub struct AuthService<R: AdminRepository + ?Sized> {
    repo: Arc<R>,
    sessions: SessionManager,
    hasher: CredentialHasher,
}

impl<R: AdminRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, sessions: SessionManager, hasher: CredentialHasher) -> Self {
        Self { repo, sessions, hasher }
    }

    /// Check the administrator's credentials and open a session.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, SessionManager};
    /// use service::auth::domain::{AdminRecord, LoginInput};
    /// use service::auth::password::CredentialHasher;
    /// use service::auth::repository::mock::StaticAdminRepository;
    /// use std::sync::Arc;
    /// let hasher = CredentialHasher::insecure_fast();
    /// let record = AdminRecord::new("admin", "Passw0rd", &hasher).unwrap();
    /// let svc = AuthService::new(Arc::new(StaticAdminRepository::new(record)), SessionManager::new(None), hasher);
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "admin".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.username, "admin");
    /// assert!(tokio_test::block_on(svc.validate(&session.token)).is_some());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AdminSession, AuthError> {
        let Some(record) = self.repo.load().await? else {
            warn!("login attempted but no administrator is configured");
            return Err(AuthError::InvalidCredentials);
        };

        // The hash is checked even on a username mismatch so both failures cost the same.
        let name_ok: bool = record.username.as_bytes().ct_eq(input.username.as_bytes()).into();
        let password_ok = self.hasher.verify_off_thread(record.credential_hash, input.password).await;
        if !(name_ok && password_ok) {
            info!("admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.issue(&record.username).await;
        info!(session_id = %session.session_id, "admin_logged_in");
        Ok(session)
    }

    /// Resolve a raw bearer token to its live session.
    pub async fn validate(&self, token: &[u8]) -> Option<AdminSession> {
        self.sessions.validate(token).await
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, token: &[u8]) -> Result<(), AuthError> {
        if self.sessions.revoke(token).await {
            info!("admin_logged_out");
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }
}
