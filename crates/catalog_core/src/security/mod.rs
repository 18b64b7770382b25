//! Credential handling.
//!
//! # Responsibility
//! - Turn raw passwords into storable hashes and verify them later.
//!
//! # Invariants
//! - Raw passwords never leave this module in logs or errors.

pub mod password;

pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
