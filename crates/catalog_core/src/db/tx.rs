//! Explicit transaction scopes over a shared SQLite connection.
//!
//! # Responsibility
//! - Run one unit of work inside `BEGIN .. COMMIT`, rolling back on failure.
//! - Mark read-only scopes with `PRAGMA query_only` as an engine hint.
//!
//! # Invariants
//! - A scope opened while another transaction is active joins the outer one
//!   instead of nesting; the outer scope owns commit/rollback.
//! - Any `Err` returned by the body rolls back every statement it executed.

use crate::db::DbError;
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Transaction flavour requested by a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Deferred transaction with writes disabled.
    ReadOnly,
    /// Immediate transaction that takes the write lock up front.
    ReadWrite,
}

impl TxMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::ReadWrite => "read_write",
        }
    }
}

/// Scoped-transaction capability injected into services.
pub trait TransactionManager {
    /// Runs `body` in one transaction of the given mode.
    ///
    /// Commits when `body` returns `Ok`, rolls back when it returns `Err`.
    fn run<T, E, F>(&self, mode: TxMode, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DbError>;
}

/// SQLite transaction manager bound to one connection.
#[derive(Clone, Copy)]
pub struct SqliteTransactionManager<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTransactionManager<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TransactionManager for SqliteTransactionManager<'_> {
    fn run<T, E, F>(&self, mode: TxMode, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DbError>,
    {
        if !self.conn.is_autocommit() {
            return body();
        }

        let behavior = match mode {
            TxMode::ReadOnly => TransactionBehavior::Deferred,
            TxMode::ReadWrite => TransactionBehavior::Immediate,
        };
        let tx = Transaction::new_unchecked(self.conn, behavior).map_err(DbError::from)?;
        let read_only = mode == TxMode::ReadOnly;
        if read_only {
            set_query_only(self.conn, true)?;
        }

        let outcome = body();
        let reset = if read_only {
            set_query_only(self.conn, false)
        } else {
            Ok(())
        };

        match outcome {
            Ok(value) => {
                reset?;
                tx.commit().map_err(DbError::from)?;
                Ok(value)
            }
            Err(err) => {
                // Dropping `tx` rolls back.
                drop(tx);
                debug!(
                    "event=tx_rollback module=db status=ok mode={}",
                    mode.as_str()
                );
                reset?;
                Err(err)
            }
        }
    }
}

fn set_query_only(conn: &Connection, enabled: bool) -> Result<(), DbError> {
    conn.pragma_update(None, "query_only", enabled)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SqliteTransactionManager, TransactionManager, TxMode};
    use crate::db::{open_db_in_memory, DbError};

    fn category_count(conn: &rusqlite::Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn read_write_scope_commits_on_ok() {
        let conn = open_db_in_memory().unwrap();
        let tx = SqliteTransactionManager::new(&conn);

        tx.run(TxMode::ReadWrite, || -> Result<(), DbError> {
            conn.execute("INSERT INTO categories (name) VALUES ('Books');", [])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(category_count(&conn), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn read_write_scope_rolls_back_on_err() {
        let conn = open_db_in_memory().unwrap();
        let tx = SqliteTransactionManager::new(&conn);

        let result = tx.run(TxMode::ReadWrite, || -> Result<(), DbError> {
            conn.execute("INSERT INTO categories (name) VALUES ('Books');", [])?;
            conn.execute("INSERT INTO missing_table (name) VALUES ('x');", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(category_count(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn read_only_scope_rejects_writes_and_resets_afterwards() {
        let conn = open_db_in_memory().unwrap();
        let tx = SqliteTransactionManager::new(&conn);

        let result = tx.run(TxMode::ReadOnly, || -> Result<(), DbError> {
            conn.execute("INSERT INTO categories (name) VALUES ('Books');", [])?;
            Ok(())
        });
        assert!(result.is_err());

        conn.execute("INSERT INTO categories (name) VALUES ('Books');", [])
            .unwrap();
        assert_eq!(category_count(&conn), 1);
    }

    #[test]
    fn inner_scope_joins_outer_transaction() {
        let conn = open_db_in_memory().unwrap();
        let tx = SqliteTransactionManager::new(&conn);

        let result = tx.run(TxMode::ReadWrite, || -> Result<(), DbError> {
            tx.run(TxMode::ReadWrite, || -> Result<(), DbError> {
                conn.execute("INSERT INTO categories (name) VALUES ('Inner');", [])?;
                Ok(())
            })?;
            conn.execute("INSERT INTO missing_table (name) VALUES ('x');", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(category_count(&conn), 0);
    }
}
