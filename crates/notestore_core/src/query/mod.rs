//! Generic in-memory tabular query support.
//!
//! # Responsibility
//! - Describe list queries (filters, sort keys, page windows).
//! - Execute them over any `Record` collection.
//! - Parse textual query expressions for command-line callers.

pub mod engine;
pub mod expr;
pub mod types;
