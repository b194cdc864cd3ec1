//! Administrative authentication: domain types, credential source, sessions and the login service.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod session;

pub use service::AuthService;
pub use session::SessionManager;
