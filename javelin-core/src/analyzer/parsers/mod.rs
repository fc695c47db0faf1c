//! Grammar for the supported Java subset, built from the combinators in
//! [`prelude`](super::prelude).
//!
//! [`unit::parse_compilation_unit`] is the entry point; the other modules
//! hold the pieces it is assembled from.

pub mod common;
pub mod expression;
pub mod statement;
pub mod types;
pub mod unit;

pub use unit::parse_compilation_unit;
