//! Record model shared by the query engine, repositories and services.
//!
//! # Responsibility
//! - Define the `Record` contract every stored type implements.
//! - Provide the concrete `Note` record used by the notes data source.
//!
//! # Invariants
//! - Every record carries a stable integer `RecordId`.
//! - Field lookup is by name over a schema fixed at compile time.

pub mod note;
pub mod record;
pub mod value;
