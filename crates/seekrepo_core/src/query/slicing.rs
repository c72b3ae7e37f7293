//! Page requests over an ordered entity stream.
//!
//! # Invariants
//! - A query is immutable once built and consumed by one listing call.
//! - The boundary is a whole ordering value; each ordering column binds its
//!   own projection of it.

use serde::{Deserialize, Serialize};

/// Scalar comparison applied against the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

/// "Rows whose ordering tuple compares `comparison` against `value`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary<O> {
    pub comparison: Comparison,
    pub value: O,
}

/// Direction applied uniformly to every ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// No ORDER BY clause is emitted.
    #[default]
    Unspecified,
    Ascending,
    Descending,
}

impl Order {
    pub fn is_ordered(self) -> bool {
        self != Self::Unspecified
    }

    pub fn sql_keyword(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Ascending => Some("ASC"),
            Self::Descending => Some("DESC"),
        }
    }
}

/// One page request: boundary, direction, limit and post-fetch reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicingQuery<O> {
    boundary: Option<Boundary<O>>,
    #[serde(default)]
    order: Order,
    limit: Option<u32>,
    #[serde(default)]
    reverse_after_fetch: bool,
}

impl<O> Default for SlicingQuery<O> {
    fn default() -> Self {
        Self::all()
    }
}

impl<O> SlicingQuery<O> {
    /// Every row, unordered, unlimited.
    pub fn all() -> Self {
        Self {
            boundary: None,
            order: Order::Unspecified,
            limit: None,
            reverse_after_fetch: false,
        }
    }

    /// Ascending page from the start of the stream.
    pub fn first_page(limit: u32) -> Self {
        Self::all().with_order(Order::Ascending).with_limit(limit)
    }

    /// Ascending page of rows strictly after `last`.
    pub fn next_page(last: O, limit: u32) -> Self {
        Self::first_page(limit).with_boundary(Comparison::Greater, last)
    }

    /// Page of rows strictly before `first`, returned in ascending order.
    ///
    /// Queried descending so the store can walk the ordering index
    /// backwards, then reversed after fetch.
    pub fn previous_page(first: O, limit: u32) -> Self {
        Self::last_page(limit).with_boundary(Comparison::Less, first)
    }

    /// Final page of the stream, returned in ascending order.
    pub fn last_page(limit: u32) -> Self {
        Self::all()
            .with_order(Order::Descending)
            .with_limit(limit)
            .reversed_after_fetch()
    }

    pub fn with_boundary(mut self, comparison: Comparison, value: O) -> Self {
        self.boundary = Some(Boundary { comparison, value });
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn reversed_after_fetch(mut self) -> Self {
        self.reverse_after_fetch = true;
        self
    }

    pub fn boundary(&self) -> Option<&Boundary<O>> {
        self.boundary.as_ref()
    }

    pub fn has_conditions(&self) -> bool {
        self.boundary.is_some()
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_ordered()
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn needs_reverse(&self) -> bool {
        self.reverse_after_fetch
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparison, Order, SlicingQuery};

    #[test]
    fn all_has_no_clauses() {
        let query = SlicingQuery::<i64>::all();
        assert!(!query.has_conditions());
        assert!(!query.is_ordered());
        assert_eq!(query.limit(), None);
        assert!(!query.needs_reverse());
    }

    #[test]
    fn previous_page_walks_backwards_and_reverses() {
        let query = SlicingQuery::previous_page(10_i64, 5);
        let boundary = query.boundary().unwrap();
        assert_eq!(boundary.comparison, Comparison::Less);
        assert_eq!(boundary.value, 10);
        assert_eq!(query.order(), Order::Descending);
        assert_eq!(query.limit(), Some(5));
        assert!(query.needs_reverse());
    }

    #[test]
    fn next_page_is_ascending_and_exclusive() {
        let query = SlicingQuery::next_page(3_i64, 2);
        assert_eq!(query.boundary().unwrap().comparison.as_sql(), ">");
        assert_eq!(query.order().sql_keyword(), Some("ASC"));
        assert!(!query.needs_reverse());
    }
}
