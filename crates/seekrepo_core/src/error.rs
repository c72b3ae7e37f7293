//! Error taxonomy for descriptor configuration and repository calls.
//!
//! # Responsibility
//! - Separate configuration mistakes from store failures and row-count
//!   invariant violations.
//! - Carry table name and rendered SQL so failures can be diagnosed.
//!
//! # Invariants
//! - "Not found" and "nothing changed" are values, never errors.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Descriptor or query shape that can never produce valid SQL.
///
/// Raised before any statement is prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Table or column name outside `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidIdentifier(String),
    /// Same column declared twice in one statement's column list.
    DuplicateColumn(&'static str),
    /// A slicing condition or ORDER BY was requested with no ordering columns.
    EmptyOrdering { clause: &'static str },
    /// `LIMIT 0` was requested.
    ZeroLimit,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
            Self::DuplicateColumn(column) => write!(f, "column `{column}` declared twice"),
            Self::EmptyOrdering { clause } => {
                write!(f, "ordering definition must not be empty for {clause} clause")
            }
            Self::ZeroLimit => write!(f, "slicing limit must be positive"),
        }
    }
}

impl Error for ConfigError {}

/// Statement kind whose affected-row count is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOperation {
    Insert,
    GeneratedKey,
    Update,
    Delete,
}

impl Display for RowOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::GeneratedKey => "generated key fetch",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Row count a statement is contractually allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedRows {
    Exactly(usize),
    AtMost(usize),
}

impl ExpectedRows {
    pub fn admits(self, actual: usize) -> bool {
        match self {
            Self::Exactly(expected) => actual == expected,
            Self::AtMost(limit) => actual <= limit,
        }
    }
}

impl Display for ExpectedRows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exactly(count) => write!(f, "exactly {count}"),
            Self::AtMost(count) => write!(f, "at most {count}"),
        }
    }
}

/// Repository call failure.
#[derive(Debug)]
pub enum RepoError {
    /// Descriptors or slicing query rejected before SQL was built.
    Config { table: String, source: ConfigError },
    /// Statement preparation, execution or row decoding failed.
    Store {
        table: String,
        sql: String,
        source: rusqlite::Error,
    },
    /// Affected or returned row count broke the key uniqueness contract.
    UnexpectedRowCount {
        table: String,
        sql: String,
        operation: RowOperation,
        expected: ExpectedRows,
        actual: usize,
    },
    /// Transaction control failure.
    Db(DbError),
}

impl RepoError {
    /// Rendered SQL of the failing statement, when one was built.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Store { sql, .. } | Self::UnexpectedRowCount { sql, .. } => Some(sql),
            Self::Config { .. } | Self::Db(_) => None,
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Config { table, .. }
            | Self::Store { table, .. }
            | Self::UnexpectedRowCount { table, .. } => Some(table),
            Self::Db(_) => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { table, source } => {
                write!(f, "invalid repository configuration for `{table}`: {source}")
            }
            Self::Store { table, sql, source } => {
                write!(f, "error executing query on `{table}`: {sql}: {source}")
            }
            Self::UnexpectedRowCount {
                table,
                sql,
                operation,
                expected,
                actual,
            } => write!(
                f,
                "{operation} on `{table}` affected {actual} rows, expected {expected}: {sql}"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
            Self::UnexpectedRowCount { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
