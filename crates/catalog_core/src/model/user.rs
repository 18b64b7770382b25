//! User entity.
//!
//! # Invariants
//! - `password` always holds a hash, never the raw secret.
//! - `email` is unique across users; uniqueness is checked before writes.

use crate::model::relation::{Reference, RelationSet};
use crate::model::role::Role;
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};
use once_cell::sync::Lazy;
use regex::Regex;

pub type UserId = EntityId;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Account holder linked to any number of roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Password hash. Never exposed through representations.
    pub password: String,
    pub roles: RelationSet<Role>,
}

impl User {
    /// Creates an entity attached to an existing row, ready for a full-field
    /// overwrite. The stored password is kept unless one is set explicitly.
    pub fn attached(reference: Reference<User>) -> Self {
        Self {
            id: Some(reference.id()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.first_name.trim().is_empty() {
            errors.push("firstName", "First name is required");
        }
        if !is_valid_email(&self.email) {
            errors.push("email", "Please enter a valid email");
        }
        errors.into_result()
    }
}

impl Entity for User {
    const NAME: &'static str = "user";

    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

/// Returns whether `value` looks like `local@domain.tld`.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, User};

    #[test]
    fn email_shape_is_checked() {
        assert!(is_valid_email("maria@gmail.com"));
        assert!(!is_valid_email("maria@gmail"));
        assert!(!is_valid_email("maria gmail.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn blank_first_name_is_reported() {
        let user = User {
            first_name: "  ".to_string(),
            email: "bob@example.com".to_string(),
            ..User::default()
        };
        let err = user.validate().unwrap_err();
        assert!(err.has_field("firstName"));
        assert!(!err.has_field("email"));
    }
}
