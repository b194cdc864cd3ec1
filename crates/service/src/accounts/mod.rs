//! Account domain types and name validation shared by every store implementation.

pub mod model;
pub mod validation;

pub use model::{Domain, Recipient, User};
