//! Descriptor-driven repository layer over SQLite.
//! Entities map onto tables through typed descriptors; keyed CRUD and
//! keyset pagination are generated from them.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use db::{
    open_db, open_db_in_memory, ConnectionOptions, DbError, DbResult, SqlConnection,
    TransactionMode,
};
pub use error::{ConfigError, ExpectedRows, RepoError, RepoResult, RowOperation};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::changed::Changed;
pub use model::column::{Codec, Column};
pub use model::component::{AtomicComponent, Component};
pub use model::storable::{StorableClass, StorableClassBuilder};
pub use query::{Boundary, BuiltStatement, Comparison, Order, SlicingQuery, SqlBuilder};
pub use repo::{
    AutogeneratedKeyConfiguration, DirectoryConfiguration, DirectoryTable, IndexedConfiguration,
    IndexedTable, Keyless, ReadableConfiguration, ReaderTable, RepositoryIndex, RepositorySupport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
