//! Statement preparation and transaction control over one SQLite connection.
//!
//! # Responsibility
//! - Hand out prepared statements, with or without generated-key retrieval.
//! - Expose begin/commit/rollback as thin pass-throughs.
//!
//! # Invariants
//! - Transaction state is read from SQLite itself (`is_autocommit`), never
//!   cached on this side.

use super::{DbError, DbResult};
use log::{debug, warn};
use rusqlite::{Connection, DropBehavior, Statement, Transaction, TransactionBehavior};

/// Locking behavior requested when a transaction begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Locks are acquired lazily on first read/write.
    #[default]
    Deferred,
    /// A write lock is acquired immediately.
    Immediate,
    /// Readers and writers are both excluded.
    Exclusive,
}

impl TransactionMode {
    pub fn behavior(self) -> TransactionBehavior {
        match self {
            Self::Deferred => TransactionBehavior::Deferred,
            Self::Immediate => TransactionBehavior::Immediate,
            Self::Exclusive => TransactionBehavior::Exclusive,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Immediate => "immediate",
            Self::Exclusive => "exclusive",
        }
    }
}

/// One SQLite connection as seen by the repository layer.
pub struct SqlConnection {
    conn: Connection,
}

impl SqlConnection {
    /// Wraps an already configured connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying driver connection, for schema setup and ad-hoc SQL.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }

    /// Runs one or more raw SQL statements (DDL, fixtures).
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn prepare_statement(&self, sql: &str) -> rusqlite::Result<Statement<'_>> {
        self.conn.prepare(sql)
    }

    pub fn prepare_statement_without_generated_keys(
        &self,
        sql: &str,
    ) -> rusqlite::Result<Statement<'_>> {
        self.conn.prepare(sql)
    }

    /// Prepares an INSERT whose result rows are the generated key columns.
    ///
    /// SQLite reports generated keys through `RETURNING`; with no declared
    /// key columns the implicit `rowid` is returned instead.
    pub fn prepare_statement_with_generated_keys(
        &self,
        sql: &str,
        key_columns: &[&str],
    ) -> rusqlite::Result<Statement<'_>> {
        let returning = if key_columns.is_empty() {
            "rowid".to_string()
        } else {
            key_columns.join(", ")
        };
        self.conn.prepare(&format!("{sql} RETURNING {returning}"))
    }

    /// Number of rows touched by the most recently completed statement.
    pub fn last_changes(&self) -> usize {
        usize::try_from(self.conn.changes()).unwrap_or(usize::MAX)
    }

    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    pub fn begin_transaction(&self) -> DbResult<()> {
        self.begin_transaction_with(TransactionMode::default())
    }

    pub fn begin_transaction_with(&self, mode: TransactionMode) -> DbResult<()> {
        let mut tx = self.start_transaction(mode)?;
        // Stays open until `commit_transaction`/`rollback_transaction`.
        tx.set_drop_behavior(DropBehavior::Ignore);
        Ok(())
    }

    pub fn commit_transaction(&self) -> DbResult<()> {
        if !self.in_transaction() {
            return Err(DbError::NoActiveTransaction);
        }
        self.conn.execute_batch("COMMIT;")?;
        debug!("event=tx_commit module=db status=ok");
        Ok(())
    }

    pub fn rollback_transaction(&self) -> DbResult<()> {
        if !self.in_transaction() {
            return Err(DbError::NoActiveTransaction);
        }
        self.conn.execute_batch("ROLLBACK;")?;
        debug!("event=tx_rollback module=db status=ok");
        Ok(())
    }

    /// Rolls back when a transaction is still open; no-op otherwise.
    ///
    /// Meant for cleanup paths that cannot know whether commit was reached.
    pub fn rollback_transaction_if_not_committed(&self) -> DbResult<()> {
        if self.in_transaction() {
            self.rollback_transaction()?;
        }
        Ok(())
    }

    /// Runs `f` inside a transaction: commit on `Ok`, rollback on `Err`.
    ///
    /// A failed COMMIT rolls the transaction back and returns the commit
    /// error. A rollback failure is logged and the error from `f` wins.
    pub fn with_transaction<T, E>(
        &self,
        mode: TransactionMode,
        f: impl FnOnce(&Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let tx = self.start_transaction(mode)?;
        match f(self) {
            Ok(value) => {
                // Dropping a transaction whose COMMIT failed rolls it back.
                if let Err(err) = tx.commit() {
                    warn!("event=tx_commit module=db status=error error={err}");
                    return Err(DbError::from(err).into());
                }
                debug!("event=tx_commit module=db status=ok");
                Ok(value)
            }
            Err(err) => {
                if self.in_transaction() {
                    match tx.rollback() {
                        Ok(()) => debug!("event=tx_rollback module=db status=ok"),
                        Err(rollback_err) => {
                            warn!("event=tx_rollback module=db status=error error={rollback_err}")
                        }
                    }
                }
                Err(err)
            }
        }
    }

    fn start_transaction(&self, mode: TransactionMode) -> DbResult<Transaction<'_>> {
        if self.in_transaction() {
            return Err(DbError::TransactionAlreadyActive);
        }
        let tx = Transaction::new_unchecked(&self.conn, mode.behavior())?;
        debug!("event=tx_begin module=db status=ok mode={}", mode.as_str());
        Ok(tx)
    }
}
