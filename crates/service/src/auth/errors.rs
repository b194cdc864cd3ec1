use thiserror::Error;

/// Errors of the administrative authentication workflow
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user and wrong password are deliberately indistinguishable.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("missing or invalid session token")]
    Unauthorized,
    #[error("admin credentials unavailable: {0}")]
    AdminRecord(String),
    #[error("hashing error: {0}")]
    Hashing(String),
}
