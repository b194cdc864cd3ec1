//! Storage helpers for service layer
//!
//! JSON document files written with rename-into-place so a crash never leaves a
//! half-written record behind.

pub mod json_file;
