//! SQLite connection collaborator for the repository layer.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Prepare statements for the repository layer.
//! - Delegate transaction control verbatim to SQLite.
//!
//! # Invariants
//! - Nothing in this module holds a transaction open across calls on its
//!   own; callers own begin/commit/rollback.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

mod connection;
mod open;

pub use connection::{SqlConnection, TransactionMode};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `commit`/`rollback` called while the connection is in autocommit mode.
    NoActiveTransaction,
    /// `begin` called while a transaction is already open.
    TransactionAlreadyActive,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NoActiveTransaction => write!(f, "no active transaction on connection"),
            Self::TransactionAlreadyActive => {
                write!(f, "a transaction is already active on connection")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NoActiveTransaction => None,
            Self::TransactionAlreadyActive => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Connection bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Whether `PRAGMA foreign_keys = ON` is applied.
    pub foreign_keys: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            foreign_keys: true,
        }
    }
}
