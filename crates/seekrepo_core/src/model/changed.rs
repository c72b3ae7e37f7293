//! Old/new value pairs for diff-based updates.

use super::component::Component;
use super::storable::StorableClass;

/// A value before and after a change. Carries no storage identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changed<V> {
    old: V,
    new: V,
}

impl<V> Changed<V> {
    pub fn from_to(old: V, new: V) -> Self {
        Self { old, new }
    }

    pub fn old_value(&self) -> &V {
        &self.old
    }

    pub fn new_value(&self) -> &V {
        &self.new
    }

    pub fn into_new_value(self) -> V {
        self.new
    }

    /// Components of `class` whose values differ, in declaration order.
    pub fn changed_components<'c>(
        &self,
        class: &'c StorableClass<V>,
    ) -> Vec<&'c (dyn Component<V> + 'static)> {
        class
            .components()
            .iter()
            .map(Box::as_ref)
            .filter(|component| component.differs(&self.old, &self.new))
            .collect()
    }

    pub fn changed_columns(&self, class: &StorableClass<V>) -> Vec<&'static str> {
        self.changed_components(class)
            .into_iter()
            .map(|component| component.column_name())
            .collect()
    }
}
