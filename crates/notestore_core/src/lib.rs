//! Core domain logic for notestore.
//! Notes live in one in-memory collection queried with filter, sort and
//! pagination, and persisted as whole snapshots after every write.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, CoreConfig, StorageKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{default_notes, Note, NoteFields};
pub use model::record::{FieldDescriptor, Record, RecordId, ValidationIssue};
pub use model::value::{FieldValue, ValueKind};
pub use query::engine::{FilterMode, QueryEngine, QueryError, QueryResult};
pub use query::expr::{parse_filter, parse_sort};
pub use query::types::{
    FilterCondition, FilterOperator, ListQuery, Page, PageRequest, SortDirection, SortKey,
    DEFAULT_PAGE_SIZE,
};
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SnapshotRepository};
pub use service::note_service::{
    open_note_service, parse_record_id, ConfiguredNoteRepository, NoteService, NoteServiceError,
    ValidationReport,
};
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, PersistenceBackend, SnapshotBackend, SqliteStore,
    StorageError, StorageResult,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
