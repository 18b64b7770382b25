//! Category entity.

use crate::model::relation::Reference;
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};

pub type CategoryId = EntityId;

/// Product grouping. Owns no other entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub id: Option<CategoryId>,
    pub name: String,
    /// Epoch ms, set by the store on insert.
    pub created_at: Option<i64>,
    /// Epoch ms, set by the store on every update.
    pub updated_at: Option<i64>,
}

impl Category {
    /// Creates an unsaved category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an entity attached to an existing row, ready for a full-field
    /// overwrite.
    pub fn attached(reference: Reference<Category>) -> Self {
        Self {
            id: Some(reference.id()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        errors.into_result()
    }
}

impl Entity for Category {
    const NAME: &'static str = "category";

    fn id(&self) -> Option<EntityId> {
        self.id
    }
}
