//! Page requests and SQL rendering.
//!
//! # Responsibility
//! - Describe one page of an ordered stream (`slicing`).
//! - Render SQL text and its positional binders together (`builder`).

pub mod builder;
pub mod slicing;

pub use builder::{BuiltStatement, SqlBuilder};
pub use slicing::{Boundary, Comparison, Order, SlicingQuery};
