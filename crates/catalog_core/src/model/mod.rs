//! Catalog domain model.
//!
//! # Responsibility
//! - Define the in-memory shape of persisted catalog rows and their relations.
//! - Provide model-level validation used before every write.
//! - Define paging/sorting request and result types.
//!
//! # Invariants
//! - `id == None` means "not persisted yet"; ids are assigned by the store.
//! - Relation sets are only ever replaced as a whole.

pub mod category;
pub mod page;
pub mod product;
pub mod relation;
pub mod role;
pub mod user;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Surrogate row identifier shared by every catalog table.
pub type EntityId = i64;

/// Persisted catalog row.
pub trait Entity {
    /// Lowercase entity name used in errors and log events.
    const NAME: &'static str;

    /// Store-assigned id, `None` before the first insert.
    fn id(&self) -> Option<EntityId>;
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
