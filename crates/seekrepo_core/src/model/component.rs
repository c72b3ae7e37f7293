//! Field projections bound to columns.
//!
//! # Invariants
//! - A component never owns entity data; it only projects from `&T`.
//! - Two entities agree on a component when their projected values are
//!   equal. `Option` columns compare null-safely (`None == None`).

use super::column::Column;
use rusqlite::Statement;

/// Type-erased view of one entity field bound to one column.
///
/// Lets a `StorableClass<T>` hold components projecting to different value
/// types in one ordered list.
pub trait Component<T>: Send + Sync {
    fn column_name(&self) -> &'static str;

    /// Projects the field out of `entity` and binds it at `index`.
    fn bind(&self, stmt: &mut Statement<'_>, index: usize, entity: &T) -> rusqlite::Result<()>;

    /// Whether `old` and `new` disagree on this component.
    fn differs(&self, old: &T, new: &T) -> bool;
}

type Projection<T, U> = Box<dyn Fn(&T) -> U + Send + Sync>;

/// "Entity `T` has a column whose value is `projection(entity)`".
pub struct AtomicComponent<T, U> {
    column: Column<U>,
    projection: Projection<T, U>,
}

impl<T, U> AtomicComponent<T, U> {
    pub fn new(column: Column<U>, projection: impl Fn(&T) -> U + Send + Sync + 'static) -> Self {
        Self {
            column,
            projection: Box::new(projection),
        }
    }

    pub fn column(&self) -> &Column<U> {
        &self.column
    }

    pub fn project(&self, entity: &T) -> U {
        (self.projection)(entity)
    }
}

impl<T, U: PartialEq> Component<T> for AtomicComponent<T, U> {
    fn column_name(&self) -> &'static str {
        self.column.name()
    }

    fn bind(&self, stmt: &mut Statement<'_>, index: usize, entity: &T) -> rusqlite::Result<()> {
        let value = self.project(entity);
        self.column.bind(stmt, index, &value)
    }

    fn differs(&self, old: &T, new: &T) -> bool {
        self.project(old) != self.project(new)
    }
}
