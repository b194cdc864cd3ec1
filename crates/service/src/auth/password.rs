//! Credential hashing: Argon2id PHC strings with per-hash random salts.

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HashError(pub String);

/// Argon2id hasher. Cost parameters apply to new hashes only; verification reads the
/// parameters embedded in the stored hash.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self { Self { params: Params::default() } }
}

impl CredentialHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| HashError(e.to_string()))?;
        Ok(Self { params })
    }

    /// Minimum-cost parameters; only meant for tests.
    pub fn insecure_fast() -> Self {
        Self::new(Params::MIN_M_COST, 1, 1).unwrap_or_default()
    }

    fn argon(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Returns `true` only on a positive match. A malformed or unsupported hash is a mismatch.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored credential hash is unparsable; treating as mismatch");
                return false;
            }
        };
        self.argon().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// `hash` on the blocking pool, keeping async workers free during the Argon2 work.
    pub async fn hash_off_thread(&self, password: String) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError(format!("hashing task failed: {e}")))?
    }

    /// `verify` on the blocking pool. A failed task counts as a mismatch.
    pub async fn verify_off_thread(&self, hash: String, password: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .unwrap_or(false)
    }
}
