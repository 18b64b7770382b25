//! Typed entity references and many-to-many relation sets.
//!
//! # Responsibility
//! - Represent a handle to a persisted row without loading its columns.
//! - Hold the owning side of a many-to-many relation (product categories,
//!   user roles) as a deduplicated, order-irrelevant set of handles.
//!
//! # Invariants
//! - A `RelationSet` contains each referenced id at most once.
//! - The only mutation is `replace_all`: relations are cleared and rebuilt
//!   from the declared handles, never merged.
//! - A handle built with `Reference::new` is unchecked; existence is verified
//!   when the owning entity is saved.

use crate::model::EntityId;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle to one row of entity `T`, identified by id only.
pub struct Reference<T> {
    id: EntityId,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Reference<T> {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            _entity: PhantomData,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reference<T> {}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Reference<T> {}

impl<T> PartialOrd for Reference<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Reference<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Reference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Debug for Reference<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Reference").field(&self.id).finish()
    }
}

/// Owning side of a many-to-many relation.
pub struct RelationSet<T> {
    members: BTreeSet<Reference<T>>,
}

impl<T> RelationSet<T> {
    pub fn new() -> Self {
        Self {
            members: BTreeSet::new(),
        }
    }

    /// Builds a set from persisted link ids, collapsing duplicates.
    pub fn from_ids(ids: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            members: ids.into_iter().map(Reference::new).collect(),
        }
    }

    /// Clears the current relations and rebuilds them from `references`.
    ///
    /// An empty input removes every relation.
    pub fn replace_all(&mut self, references: impl IntoIterator<Item = Reference<T>>) {
        self.members.clear();
        self.members.extend(references);
    }

    /// Related ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.members.iter().map(Reference::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference<T>> {
        self.members.iter()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&Reference::new(id))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T> Default for RelationSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RelationSet<T> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<T> PartialEq for RelationSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl<T> Eq for RelationSet<T> {}

impl<T> Debug for RelationSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Reference, RelationSet};

    struct Tag;

    #[test]
    fn replace_all_clears_previous_members() {
        let mut set: RelationSet<Tag> = RelationSet::from_ids([1, 2, 3]);
        set.replace_all([Reference::new(4)]);

        assert_eq!(set.ids(), vec![4]);
        assert!(!set.contains(1));
    }

    #[test]
    fn replace_all_with_empty_input_removes_everything() {
        let mut set: RelationSet<Tag> = RelationSet::from_ids([1, 2]);
        set.replace_all(std::iter::empty());

        assert!(set.is_empty());
    }

    #[test]
    fn duplicates_collapse_and_replacing_twice_is_stable() {
        let mut set: RelationSet<Tag> = RelationSet::new();
        set.replace_all([3, 1, 3].map(Reference::new));
        let first = set.clone();
        set.replace_all([1, 3].map(Reference::new));

        assert_eq!(set.len(), 2);
        assert_eq!(set, first);
        assert_eq!(set.ids(), vec![1, 3]);
    }
}
