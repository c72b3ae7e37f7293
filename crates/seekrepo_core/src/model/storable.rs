//! Ordered composite descriptors (keys, values, ordering tuples).
//!
//! # Responsibility
//! - Fix column order for SQL text and bind order in one place.
//! - Decode result rows back into typed entities.
//!
//! # Invariants
//! - Component order is significant: it is the SQL column order and the
//!   positional bind order.
//! - The decoder reads the same column set the components declare.
//! - A class may be empty; `StorableClass::unit()` is the shared empty key.

use super::column::Column;
use super::component::{AtomicComponent, Component};
use super::identifier::validate_columns;
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use rusqlite::Row;
use std::fmt::{Debug, Formatter};

type Decoder<T> = Box<dyn Fn(&Row<'_>) -> rusqlite::Result<T> + Send + Sync>;

static UNIT_CLASS: Lazy<StorableClass<()>> = Lazy::new(|| StorableClass {
    components: Vec::new(),
    decoder: Box::new(|_| Ok(())),
});

/// Descriptor of a composite tuple stored across one or more columns.
pub struct StorableClass<T> {
    components: Vec<Box<dyn Component<T>>>,
    decoder: Decoder<T>,
}

impl<T: 'static> StorableClass<T> {
    pub fn builder() -> StorableClassBuilder<T> {
        StorableClassBuilder {
            components: Vec::new(),
        }
    }
}

impl<T> StorableClass<T> {
    pub fn components(&self) -> &[Box<dyn Component<T>>] {
        &self.components
    }

    /// Components in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Component<T> + 'static)> + '_ {
        self.components.iter().map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components
            .iter()
            .map(|component| component.column_name())
    }

    /// Decodes one result row.
    pub fn create_instance(&self, row: &Row<'_>) -> rusqlite::Result<T> {
        (self.decoder)(row)
    }
}

impl StorableClass<()> {
    /// Zero-column descriptor used where no key applies.
    pub fn unit() -> &'static StorableClass<()> {
        &UNIT_CLASS
    }
}

impl<T> Debug for StorableClass<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorableClass")
            .field("columns", &self.column_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Accumulates components in declaration order.
pub struct StorableClassBuilder<T> {
    components: Vec<Box<dyn Component<T>>>,
}

impl<T: 'static> StorableClassBuilder<T> {
    /// Appends a field bound to `column`.
    pub fn component<U: PartialEq + 'static>(
        mut self,
        column: Column<U>,
        projection: impl Fn(&T) -> U + Send + Sync + 'static,
    ) -> Self {
        self.components
            .push(Box::new(AtomicComponent::new(column, projection)));
        self
    }

    /// Finishes the class with the row decoder.
    ///
    /// # Errors
    /// - `InvalidIdentifier` for a column name that is not a plain identifier.
    /// - `DuplicateColumn` when a column is declared twice.
    pub fn build(
        self,
        decoder: impl Fn(&Row<'_>) -> rusqlite::Result<T> + Send + Sync + 'static,
    ) -> Result<StorableClass<T>, ConfigError> {
        validate_columns(self.components.iter().map(|c| c.column_name()))?;
        Ok(StorableClass {
            components: self.components,
            decoder: Box::new(decoder),
        })
    }
}
