//! Relation synchronization from representation id lists.
//!
//! # Invariants
//! - The entity's relation set is replaced as a whole; there is no
//!   incremental add or remove.
//! - References are unchecked here. Dangling ids fail later, inside the
//!   save transaction.

use crate::model::relation::RelationSet;
use crate::model::validation::ValidationError;
use crate::model::EntityId;
use crate::repo::CrudRepository;

/// Collects declared relation ids, rejecting entries without one.
pub(crate) fn declared_ids(
    field_name: &str,
    ids: impl IntoIterator<Item = Option<EntityId>>,
) -> Result<Vec<EntityId>, ValidationError> {
    let mut declared = Vec::new();
    let mut errors = ValidationError::new();
    for id in ids {
        match id {
            Some(id) => declared.push(id),
            None => errors.push(field_name, "Related id is required"),
        }
    }
    errors.into_result()?;
    Ok(declared)
}

/// Replaces `relations` with lazy references to `ids`; duplicates collapse.
pub(crate) fn sync_relations<R>(
    relations: &mut RelationSet<R::Entity>,
    repo: &R,
    ids: &[EntityId],
) where
    R: CrudRepository,
{
    relations.replace_all(ids.iter().map(|id| repo.lazy_reference(*id)));
}
