//! Typed entity descriptors.
//!
//! # Responsibility
//! - Describe how entity fields map onto columns without reflection.
//! - Keep column order, bind order and decode order fixed at construction.
//!
//! # Invariants
//! - Column names are validated identifiers, never caller input.

pub mod changed;
pub mod column;
pub mod component;
pub mod identifier;
pub mod storable;
