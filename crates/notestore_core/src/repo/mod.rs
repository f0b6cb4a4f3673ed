//! Repository layer abstractions and the snapshot-persisted implementation.
//!
//! # Responsibility
//! - Define the CRUD contract services depend on.
//! - Isolate persistence and locking details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   storage transport errors.
//! - Validation is reported as data and never blocks a repository write.

pub mod record_repo;
