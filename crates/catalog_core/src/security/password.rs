//! Password hashing capability and its Argon2 implementation.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure while hashing or parsing a stored hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    /// The hasher could not produce a hash.
    Hash(String),
    /// The stored value is not a valid PHC string.
    MalformedHash(String),
    /// The stored hash parsed but cannot be checked, e.g. another algorithm.
    Verify(String),
}

impl Display for PasswordHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(message) => write!(f, "password hashing failed: {message}"),
            Self::MalformedHash(message) => {
                write!(f, "stored password hash is malformed: {message}")
            }
            Self::Verify(message) => write!(f, "password verification failed: {message}"),
        }
    }
}

impl Error for PasswordHashError {}

/// One-way password hashing injected into the user service.
pub trait PasswordHasher {
    /// Hashes `raw` into a self-describing string safe to persist.
    fn hash(&self, raw: &str) -> Result<String, PasswordHashError>;

    /// Checks `raw` against a hash produced by [`PasswordHasher::hash`].
    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Argon2id with default parameters and a random salt per hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, raw: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::Hash(err.to_string()))
    }

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| PasswordHashError::MalformedHash(err.to_string()))?;
        match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHashError::Verify(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};

    #[test]
    fn hash_round_trips_through_verify() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash("123456").expect("hashing should succeed");

        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("123456"));
        assert!(hasher.verify("123456", &hash).unwrap());
        assert!(!hasher.verify("654321", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher::new();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let err = Argon2PasswordHasher::new()
            .verify("x", "not-a-hash")
            .unwrap_err();
        assert!(matches!(err, PasswordHashError::MalformedHash(_)));
    }

    #[test]
    fn foreign_algorithm_is_an_error_not_a_mismatch() {
        let err = Argon2PasswordHasher::new()
            .verify(
                "secret",
                "$pbkdf2-sha256$i=1000$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA",
            )
            .unwrap_err();
        assert!(matches!(err, PasswordHashError::Verify(_)));
    }
}
