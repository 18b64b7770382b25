//! Catalog use-case services.
//!
//! # Responsibility
//! - Run each use case inside one transaction scope and map entities to
//!   representations.
//! - Translate repository outcomes into the service error taxonomy.
//!
//! # Invariants
//! - Mutations run in a read-write scope; reads in a read-only scope.
//!   `delete` is a single statement and opens no explicit scope.
//! - A missing id always surfaces as `NotFound("Id not found {id}")` on
//!   update and delete.

use crate::db::DbError;
use crate::model::relation::Reference;
use crate::model::validation::{FieldMessage, ValidationError};
use crate::model::EntityId;
use crate::repo::RepoError;
use crate::security::PasswordHashError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod auth_service;
pub mod category_service;
pub mod product_service;
mod relations;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error surfaced to callers of the catalog core.
#[derive(Debug)]
pub enum ServiceError {
    /// Requested row does not exist.
    NotFound(String),
    /// Store refused the change, e.g. deleting a referenced row.
    Database(String),
    /// A declared relation id names no existing row.
    DanglingReference { entity: &'static str, id: EntityId },
    /// One or more representation fields are invalid.
    FieldValidation(Vec<FieldMessage>),
    /// Password hashing failed.
    PasswordHash(String),
    /// Any other repository failure, unchanged.
    Repo(RepoError),
}

impl ServiceError {
    /// HTTP-equivalent status code for this error.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Database(_) => 409,
            Self::DanglingReference { .. } => 400,
            Self::FieldValidation(_) => 422,
            Self::PasswordHash(_) => 500,
            Self::Repo(err) => err.status_hint(),
        }
    }

    /// Field messages when this is a validation failure, empty otherwise.
    pub fn field_messages(&self) -> &[FieldMessage] {
        match self {
            Self::FieldValidation(fields) => fields,
            _ => &[],
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) | Self::Database(message) => write!(f, "{message}"),
            Self::DanglingReference { entity, id } => {
                write!(f, "referenced {entity} does not exist: {id}")
            }
            Self::FieldValidation(fields) => {
                write!(f, "validation failed")?;
                for (index, field) in fields.iter().enumerate() {
                    let separator = if index == 0 { ": " } else { "; " };
                    write!(f, "{separator}{} {}", field.field_name, field.message)?;
                }
                Ok(())
            }
            Self::PasswordHash(message) => write!(f, "password hashing failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::FieldValidation(err.fields),
            RepoError::DanglingReference { entity, id } => Self::DanglingReference { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::FieldValidation(value.fields)
    }
}

impl From<PasswordHashError> for ServiceError {
    fn from(value: PasswordHashError) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

pub(crate) fn id_not_found(id: EntityId) -> ServiceError {
    ServiceError::NotFound(format!("Id not found {id}"))
}

pub(crate) fn entity_not_found() -> ServiceError {
    ServiceError::NotFound("Entity not found".to_string())
}

/// Resolves a handle for update, reporting a missing row as `NotFound`.
pub(crate) fn resolve_handle<T>(
    resolved: Result<Reference<T>, RepoError>,
    id: EntityId,
) -> ServiceResult<Reference<T>> {
    match resolved {
        Ok(reference) => Ok(reference),
        Err(RepoError::DanglingReference { .. }) => Err(id_not_found(id)),
        Err(err) => Err(err.into()),
    }
}

/// Maps the outcome of a save on an update path.
///
/// The row can vanish between `get_reference` and `save`; that is still a
/// missing id, not a storage failure.
pub(crate) fn translate_update<T>(saved: Result<T, RepoError>, id: EntityId) -> ServiceResult<T> {
    match saved {
        Err(RepoError::NotFound { id: missing, .. }) if missing == id => Err(id_not_found(id)),
        other => other.map_err(ServiceError::from),
    }
}

/// Maps the outcome of `delete_by_id` onto the delete contract.
pub(crate) fn translate_delete(deleted: Result<(), RepoError>, id: EntityId) -> ServiceResult<()> {
    match deleted {
        Ok(()) => Ok(()),
        Err(RepoError::NotFound { .. }) => Err(id_not_found(id)),
        Err(RepoError::IntegrityViolation { .. }) => {
            Err(ServiceError::Database("Integrity violation".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_handle, translate_delete, ServiceError};
    use crate::model::relation::Reference;
    use crate::model::validation::ValidationError;
    use crate::repo::RepoError;

    #[test]
    fn delete_outcomes_map_to_distinct_errors() {
        let missing = translate_delete(Err(RepoError::NotFound { entity: "product", id: 9 }), 9)
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(ref message) if message == "Id not found 9"));
        assert_eq!(missing.status_hint(), 404);

        let referenced = translate_delete(
            Err(RepoError::IntegrityViolation { entity: "category", id: 3 }),
            3,
        )
        .unwrap_err();
        assert!(matches!(referenced, ServiceError::Database(ref message) if message == "Integrity violation"));
        assert_eq!(referenced.status_hint(), 409);
    }

    #[test]
    fn dangling_handle_becomes_not_found() {
        let resolved: Result<Reference<()>, _> =
            Err(RepoError::DanglingReference { entity: "product", id: 1000 });
        let err = resolve_handle(resolved, 1000).unwrap_err();
        assert_eq!(err.to_string(), "Id not found 1000");
    }

    #[test]
    fn repo_validation_becomes_field_validation() {
        let err = ServiceError::from(RepoError::from(ValidationError::single(
            "name",
            "Name is required",
        )));
        assert_eq!(err.status_hint(), 422);
        assert_eq!(err.field_messages()[0].field_name, "name");
        assert_eq!(err.to_string(), "validation failed: name Name is required");
    }
}
