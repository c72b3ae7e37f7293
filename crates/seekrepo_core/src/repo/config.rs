//! Table configurations as capability traits.
//!
//! # Responsibility
//! - Name the table and descriptors each repository operation needs.
//! - Provide ready-made table structs and the keyless adapter.
//!
//! # Invariants
//! - Table names and every column list are validated at construction.
//! - Key and value columns of one table never overlap.

use crate::error::ConfigError;
use crate::model::identifier::{validate_columns, validate_identifier};
use crate::model::storable::StorableClass;

/// Table addressed by key `K`. Enough for `remove`.
pub trait RepositoryIndex<K> {
    fn table_name(&self) -> &str;
    fn key_class(&self) -> &StorableClass<K>;
}

/// Keyed table with value `V`. Supports `get`/`put`/`put_if_exists`.
pub trait IndexedConfiguration<K, V>: RepositoryIndex<K> {
    fn value_class(&self) -> &StorableClass<V>;
}

/// Table whose key `K` is generated by the store on insert.
pub trait AutogeneratedKeyConfiguration<K, V> {
    fn table_name(&self) -> &str;
    fn value_class(&self) -> &StorableClass<V>;
    /// Decodes the generated-key row returned by the insert.
    fn generated_key_class(&self) -> &StorableClass<K>;
}

/// Listable table of entries `V` ordered by tuple `O`.
pub trait ReadableConfiguration<V, O> {
    fn table_name(&self) -> &str;
    fn entry_class(&self) -> &StorableClass<V>;
    fn ordering_class(&self) -> &StorableClass<O>;
}

/// Listable table whose entries are grouped under key `K`.
pub trait DirectoryConfiguration<K, V, O>: ReadableConfiguration<V, O> {
    fn key_class(&self) -> &StorableClass<K>;
}

/// Keyed table: key columns plus value columns.
#[derive(Debug)]
pub struct IndexedTable<K, V> {
    table: String,
    key: StorableClass<K>,
    value: StorableClass<V>,
}

impl<K, V> IndexedTable<K, V> {
    /// # Errors
    /// - `InvalidIdentifier` for a malformed table name.
    /// - `DuplicateColumn` when key and value share a column.
    pub fn new(
        table: impl Into<String>,
        key: StorableClass<K>,
        value: StorableClass<V>,
    ) -> Result<Self, ConfigError> {
        let table = table.into();
        validate_identifier(&table)?;
        validate_columns(key.column_names().chain(value.column_names()))?;
        Ok(Self { table, key, value })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }
}

impl<K, V> RepositoryIndex<K> for IndexedTable<K, V> {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn key_class(&self) -> &StorableClass<K> {
        &self.key
    }
}

impl<K, V> IndexedConfiguration<K, V> for IndexedTable<K, V> {
    fn value_class(&self) -> &StorableClass<V> {
        &self.value
    }
}

impl<K, V> AutogeneratedKeyConfiguration<K, V> for IndexedTable<K, V> {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn value_class(&self) -> &StorableClass<V> {
        &self.value
    }

    fn generated_key_class(&self) -> &StorableClass<K> {
        &self.key
    }
}

/// Listable table without a grouping key.
#[derive(Debug)]
pub struct ReaderTable<V, O> {
    table: String,
    entry: StorableClass<V>,
    ordering: StorableClass<O>,
}

impl<V, O> ReaderTable<V, O> {
    /// # Errors
    /// - `InvalidIdentifier` for a malformed table name.
    pub fn new(
        table: impl Into<String>,
        entry: StorableClass<V>,
        ordering: StorableClass<O>,
    ) -> Result<Self, ConfigError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            table,
            entry,
            ordering,
        })
    }
}

impl<V, O> ReadableConfiguration<V, O> for ReaderTable<V, O> {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn entry_class(&self) -> &StorableClass<V> {
        &self.entry
    }

    fn ordering_class(&self) -> &StorableClass<O> {
        &self.ordering
    }
}

/// Listable table grouped by key columns.
#[derive(Debug)]
pub struct DirectoryTable<K, V, O> {
    table: String,
    key: StorableClass<K>,
    entry: StorableClass<V>,
    ordering: StorableClass<O>,
}

impl<K, V, O> DirectoryTable<K, V, O> {
    /// # Errors
    /// - `InvalidIdentifier` for a malformed table name.
    pub fn new(
        table: impl Into<String>,
        key: StorableClass<K>,
        entry: StorableClass<V>,
        ordering: StorableClass<O>,
    ) -> Result<Self, ConfigError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            table,
            key,
            entry,
            ordering,
        })
    }
}

impl<K, V, O> ReadableConfiguration<V, O> for DirectoryTable<K, V, O> {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn entry_class(&self) -> &StorableClass<V> {
        &self.entry
    }

    fn ordering_class(&self) -> &StorableClass<O> {
        &self.ordering
    }
}

impl<K, V, O> DirectoryConfiguration<K, V, O> for DirectoryTable<K, V, O> {
    fn key_class(&self) -> &StorableClass<K> {
        &self.key
    }
}

/// Presents a keyless reader as a directory keyed by `()`, so listing
/// has a single code path.
#[derive(Debug)]
pub struct Keyless<'c, C: ?Sized> {
    reader: &'c C,
}

impl<'c, C: ?Sized> Keyless<'c, C> {
    pub fn new(reader: &'c C) -> Self {
        Self { reader }
    }
}

impl<V, O, C> ReadableConfiguration<V, O> for Keyless<'_, C>
where
    C: ReadableConfiguration<V, O> + ?Sized,
{
    fn table_name(&self) -> &str {
        self.reader.table_name()
    }

    fn entry_class(&self) -> &StorableClass<V> {
        self.reader.entry_class()
    }

    fn ordering_class(&self) -> &StorableClass<O> {
        self.reader.ordering_class()
    }
}

impl<V, O, C> DirectoryConfiguration<(), V, O> for Keyless<'_, C>
where
    C: ReadableConfiguration<V, O> + ?Sized,
{
    fn key_class(&self) -> &StorableClass<()> {
        StorableClass::unit()
    }
}
