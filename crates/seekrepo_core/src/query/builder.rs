//! SQL text assembly with lock-step positional binding.
//!
//! # Responsibility
//! - Render column lists, predicate lists and keyset conditions from
//!   component descriptors.
//! - Record one binder for every `?` at the moment the `?` is emitted.
//!
//! # Invariants
//! - Binders are applied in emission order with one-based indexes, so the
//!   n-th placeholder always receives the n-th recorded value.
//! - Text-only helpers never emit placeholders.

use super::slicing::{Boundary, Comparison, Order};
use crate::error::ConfigError;
use crate::model::component::Component;
use crate::model::storable::StorableClass;
use rusqlite::types::ToSql;
use rusqlite::Statement;

type Binder<'a> = Box<dyn Fn(&mut Statement<'_>, usize) -> rusqlite::Result<()> + 'a>;

const COLUMN_PLACEHOLDER: &str = "{0}";

/// Append-only SQL builder borrowing the entities it will bind.
pub struct SqlBuilder<'a> {
    sql: String,
    binders: Vec<Binder<'a>>,
}

impl Default for SqlBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SqlBuilder<'a> {
    pub fn new() -> Self {
        Self {
            sql: String::new(),
            binders: Vec::new(),
        }
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Joins opaque fragments with `separator`.
    pub fn append_joined<S: AsRef<str>>(
        &mut self,
        separator: &str,
        fragments: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                self.sql.push_str(separator);
            }
            self.sql.push_str(fragment.as_ref());
        }
        self
    }

    /// Renders `template` once per component, `{0}` standing for the
    /// column name, joined with `separator`. Text only.
    pub fn append_joined_tuple_elements<'c, T: 'c>(
        &mut self,
        separator: &str,
        template: &str,
        components: impl IntoIterator<Item = &'c (dyn Component<T> + 'static)>,
    ) -> &mut Self {
        debug_assert!(!template.contains('?'), "text-only template: {template}");
        let fragments = components
            .into_iter()
            .map(|component| template.replace(COLUMN_PLACEHOLDER, component.column_name()));
        self.append_joined(separator, fragments)
    }

    /// Like `append_joined_tuple_elements`, for a template with exactly one
    /// `?`; each component's projection of `entity` is bound to it.
    pub fn append_bound_tuple_elements<T: 'a>(
        &mut self,
        separator: &str,
        template: &str,
        components: impl IntoIterator<Item = &'a (dyn Component<T> + 'static)>,
        entity: &'a T,
    ) -> &mut Self {
        debug_assert_eq!(template.matches('?').count(), 1, "template: {template}");
        for (index, component) in components.into_iter().enumerate() {
            if index > 0 {
                self.sql.push_str(separator);
            }
            self.sql
                .push_str(&template.replace(COLUMN_PLACEHOLDER, component.column_name()));
            self.binders.push(Box::new(
                move |stmt: &mut Statement<'_>, position: usize| {
                    component.bind(stmt, position, entity)
                },
            ));
        }
        self
    }

    /// Appends `text` (one `?`) and binds `value` to it.
    pub fn append_bound_value<V: ToSql + 'a>(&mut self, text: &str, value: V) -> &mut Self {
        debug_assert_eq!(text.matches('?').count(), 1, "text: {text}");
        self.sql.push_str(text);
        self.binders.push(Box::new(
            move |stmt: &mut Statement<'_>, position: usize| {
                stmt.raw_bind_parameter(position, &value)
            },
        ));
        self
    }

    /// `column <op> ?` for a single ordering component.
    pub fn append_condition_for_column<O: 'a>(
        &mut self,
        comparison: Comparison,
        component: &'a (dyn Component<O> + 'static),
        value: &'a O,
    ) -> &mut Self {
        let template = format!("{COLUMN_PLACEHOLDER} {} ?", comparison.as_sql());
        self.append_bound_tuple_elements("", &template, [component], value)
    }

    /// Lexicographic "ordering tuple <op> boundary" using scalar comparisons
    /// only:
    ///
    /// ```text
    /// ((o1 op ?) OR (o1 = ? AND o2 op ?) OR ... (o1 = ? AND ... AND on op ?))
    /// ```
    ///
    /// Block `i` binds the boundary's projection on `o1..=o(i+1)`, so the
    /// block sizes are 1, 2, ..., n. A single column renders as `o1 op ?`.
    ///
    /// # Errors
    /// - `EmptyOrdering` when `ordering` has no components.
    pub fn append_keyset_condition<O: 'a>(
        &mut self,
        boundary: &'a Boundary<O>,
        ordering: &'a StorableClass<O>,
    ) -> Result<&mut Self, ConfigError> {
        let comparison = boundary.comparison;
        let value = &boundary.value;
        let ordering = ordering.components();
        match ordering {
            [] => return Err(ConfigError::EmptyOrdering { clause: "WHERE" }),
            [single] => {
                self.append_condition_for_column(comparison, single.as_ref(), value);
            }
            _ => {
                self.append("(");
                for (index, component) in ordering.iter().enumerate() {
                    if index > 0 {
                        self.append(" OR ");
                    }
                    self.append("(");
                    if index > 0 {
                        self.append_bound_tuple_elements(
                            " AND ",
                            "{0} = ?",
                            ordering[..index].iter().map(Box::as_ref),
                            value,
                        );
                        self.append(" AND ");
                    }
                    self.append_condition_for_column(comparison, component.as_ref(), value);
                    self.append(")");
                }
                self.append(")");
            }
        }
        Ok(self)
    }

    /// ` ORDER BY o1 DIR, o2 DIR, ...`; nothing for `Order::Unspecified`.
    ///
    /// # Errors
    /// - `EmptyOrdering` when an order is requested with no components.
    pub fn append_order_by<O>(
        &mut self,
        order: Order,
        ordering: &StorableClass<O>,
    ) -> Result<&mut Self, ConfigError> {
        let Some(keyword) = order.sql_keyword() else {
            return Ok(self);
        };
        if ordering.is_empty() {
            return Err(ConfigError::EmptyOrdering { clause: "ORDER BY" });
        }
        self.append(" ORDER BY ");
        let template = format!("{COLUMN_PLACEHOLDER} {keyword}");
        Ok(self.append_joined_tuple_elements(", ", &template, ordering.iter()))
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        self.binders.len()
    }

    pub fn finish(self) -> BuiltStatement<'a> {
        BuiltStatement {
            sql: self.sql,
            binders: self.binders,
        }
    }
}

/// Rendered SQL plus the binders recorded while rendering it.
pub struct BuiltStatement<'a> {
    sql: String,
    binders: Vec<Binder<'a>>,
}

impl BuiltStatement<'_> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        self.binders.len()
    }

    /// Binds every recorded value, first placeholder at index 1.
    pub fn bind_all(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<()> {
        debug_assert_eq!(
            stmt.parameter_count(),
            self.binders.len(),
            "placeholder/binder mismatch in `{}`",
            self.sql
        );
        for (offset, binder) in self.binders.iter().enumerate() {
            binder(stmt, offset + 1)?;
        }
        Ok(())
    }
}
