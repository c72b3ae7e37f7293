//! Generic repository over descriptor-configured tables.
//!
//! # Responsibility
//! - Declare what each operation needs from a table (`config`).
//! - Run keyed point operations and paged listing (`support`).
//!
//! # Invariants
//! - Keyed writes affect at most one row; anything else is surfaced as
//!   `RepoError::UnexpectedRowCount`.
//! - The repository never opens or closes transactions implicitly.

pub mod config;
pub mod support;

pub use config::{
    AutogeneratedKeyConfiguration, DirectoryConfiguration, DirectoryTable, IndexedConfiguration,
    IndexedTable, Keyless, ReadableConfiguration, ReaderTable, RepositoryIndex,
};
pub use support::RepositorySupport;
