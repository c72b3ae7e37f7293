//! Column descriptors and per-column value codecs.

use rusqlite::types::{FromSql, ToSql};
use rusqlite::{Row, Statement};
use std::fmt::{Debug, Formatter};

/// Binds one value at a one-based positional parameter index.
pub type BindFn<U> = fn(&mut Statement<'_>, usize, &U) -> rusqlite::Result<()>;
/// Reads one value from a named result column.
pub type ReadFn<U> = fn(&Row<'_>, &str) -> rusqlite::Result<U>;

/// How values of type `U` cross the driver boundary.
pub struct Codec<U> {
    bind: BindFn<U>,
    read: ReadFn<U>,
}

impl<U> Codec<U> {
    pub fn new(bind: BindFn<U>, read: ReadFn<U>) -> Self {
        Self { bind, read }
    }

    pub fn bind(&self, stmt: &mut Statement<'_>, index: usize, value: &U) -> rusqlite::Result<()> {
        (self.bind)(stmt, index, value)
    }

    pub fn read(&self, row: &Row<'_>, column: &str) -> rusqlite::Result<U> {
        (self.read)(row, column)
    }
}

impl<U: ToSql + FromSql> Codec<U> {
    /// Codec backed by the driver's own `ToSql`/`FromSql` conversions.
    pub fn native() -> Self {
        Self::new(bind_native::<U>, read_native::<U>)
    }
}

impl<U> Clone for Codec<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Codec<U> {}

fn bind_native<U: ToSql>(
    stmt: &mut Statement<'_>,
    index: usize,
    value: &U,
) -> rusqlite::Result<()> {
    stmt.raw_bind_parameter(index, value)
}

fn read_native<U: FromSql>(row: &Row<'_>, column: &str) -> rusqlite::Result<U> {
    row.get(column)
}

/// One named database column carrying values of type `U`.
pub struct Column<U> {
    name: &'static str,
    codec: Codec<U>,
}

impl<U: ToSql + FromSql> Column<U> {
    pub fn new(name: &'static str) -> Self {
        Self::with_codec(name, Codec::native())
    }
}

impl<U> Column<U> {
    /// Column stored through a custom codec (e.g. an enum kept as text).
    pub fn with_codec(name: &'static str, codec: Codec<U>) -> Self {
        Self { name, codec }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn codec(&self) -> &Codec<U> {
        &self.codec
    }

    pub fn bind(&self, stmt: &mut Statement<'_>, index: usize, value: &U) -> rusqlite::Result<()> {
        self.codec.bind(stmt, index, value)
    }

    /// Reads this column from a result row, by name.
    pub fn read(&self, row: &Row<'_>) -> rusqlite::Result<U> {
        self.codec.read(row, self.name)
    }
}

impl<U> Clone for Column<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Column<U> {}

impl<U> Debug for Column<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column").field("name", &self.name).finish()
    }
}
