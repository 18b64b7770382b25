//! Deterministic demo catalog used by integration tests and the CLI.
//!
//! The data set has 3 categories, 25 products, 2 roles and 2 users, with ids
//! assigned in insertion order starting at 1. Both demo users log in with
//! the password `123456` (Argon2id, default parameters).

use crate::db::{DbError, DbResult, SqliteTransactionManager, TransactionManager, TxMode};
use log::info;
use rusqlite::Connection;

const DEMO_CATALOG_SQL: &str = include_str!("fixtures/demo_catalog.sql");

/// Number of products inserted by [`seed_demo_catalog`].
pub const DEMO_PRODUCT_COUNT: u64 = 25;

/// Inserts the demo catalog in one write transaction.
///
/// Expects a freshly migrated, empty database; seeding twice fails on the
/// unique role/email constraints and leaves the first seed untouched.
pub fn seed_demo_catalog(conn: &Connection) -> DbResult<()> {
    SqliteTransactionManager::new(conn).run(TxMode::ReadWrite, || {
        conn.execute_batch(DEMO_CATALOG_SQL)?;
        Ok::<(), DbError>(())
    })?;
    info!(
        "event=db_seed module=db status=ok products={}",
        DEMO_PRODUCT_COUNT
    );
    Ok(())
}
