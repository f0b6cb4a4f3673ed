//! Notes data source.
//!
//! # Responsibility
//! - Adapt a note repository to the getMany/getOne/createOne/updateOne/
//!   deleteOne/validate data-source contract.
//! - Open the configured storage medium and seed default notes.
//! - Emit metadata-only diagnostics for every operation.
//!
//! # Invariants
//! - Validation results are returned as data, never raised.
//! - Deleting an absent note succeeds.
//! - A zero page size falls back to the configured default page size.

use crate::config::{CoreConfig, StorageKind};
use crate::model::note::{default_notes, Note, NoteFields};
use crate::model::record::{FieldDescriptor, Record, RecordId, ValidationIssue};
use crate::query::engine::QueryEngine;
use crate::query::types::{ListQuery, Page};
use crate::repo::record_repo::{RecordRepository, RepoError, SnapshotRepository};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, SnapshotBackend, SqliteStore};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Note repository built from a [`CoreConfig`].
pub type ConfiguredNoteRepository = SnapshotRepository<Note, SnapshotBackend<Box<dyn KeyValueStore>>>;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(RecordId),
    /// Caller-supplied id text is not an integer.
    InvalidId(String),
    /// Persistence or query failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidId(value) => write!(f, "invalid note id `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl NoteServiceError {
    /// Stable machine-readable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoteNotFound(_) => "not_found",
            Self::InvalidId(_) => "invalid_id",
            Self::Repo(RepoError::Query(_)) => "query_failed",
            Self::Repo(RepoError::Storage(_)) => "storage_failed",
            Self::Repo(_) => "repo_failed",
        }
    }
}

/// Validation envelope matching the data-source `{ issues }` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parses a path/CLI id segment into a record id.
pub fn parse_record_id(value: &str) -> Result<RecordId, NoteServiceError> {
    value
        .trim()
        .parse::<RecordId>()
        .map_err(|_| NoteServiceError::InvalidId(value.to_string()))
}

/// Opens the storage medium named by `config` and loads (or seeds) notes.
pub fn open_note_service(
    config: &CoreConfig,
) -> Result<NoteService<ConfiguredNoteRepository>, NoteServiceError> {
    let store: Box<dyn KeyValueStore> = match config.storage {
        StorageKind::Memory => Box::new(MemoryStore::new()),
        StorageKind::File => Box::new(FileStore::open(&config.data_path).map_err(RepoError::from)?),
        StorageKind::Sqlite => {
            Box::new(SqliteStore::open(&config.data_path).map_err(RepoError::from)?)
        }
    };
    let backend = SnapshotBackend::new(store, config.storage_key.clone());
    let engine = QueryEngine::new(config.filter_mode);
    let repo = SnapshotRepository::open(backend, engine, default_notes)?;
    Ok(NoteService::new(repo).with_default_page_size(config.default_page_size))
}

/// Notes data-source facade over a repository implementation.
pub struct NoteService<P: RecordRepository<Note>> {
    repo: P,
    default_page_size: usize,
}

impl<P: RecordRepository<Note>> NoteService<P> {
    pub fn new(repo: P) -> Self {
        Self {
            repo,
            default_page_size: crate::query::types::DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size used when a request carries `0`.
    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.default_page_size = page_size;
        }
        self
    }

    pub fn repo(&self) -> &P {
        &self.repo
    }

    /// Column descriptors for list/detail views.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        Note::descriptors()
    }

    /// Lists one page of notes with filter and sort applied.
    pub fn get_many(&self, query: &ListQuery) -> Result<Page<Note>, NoteServiceError> {
        let started_at = Instant::now();
        let mut query = query.clone();
        if query.page.page_size == 0 {
            query.page.page_size = self.default_page_size;
        }

        let result = self.repo.list(&query);
        match &result {
            Ok(page) => info!(
                "event=note_get_many module=service status=ok filters={} sort_keys={} page_index={} page_size={} returned={} total={} duration_ms={}",
                query.filter.len(),
                query.sort.len(),
                query.page.page_index,
                query.page.page_size,
                page.items.len(),
                page.total_count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("note_get_many", None, err),
        }
        Ok(result?)
    }

    /// Gets one note by id.
    pub fn get_one(&self, id: RecordId) -> Result<Note, NoteServiceError> {
        let result = self.repo.get(id);
        if let Err(err) = &result {
            log_failure("note_get_one", Some(id), err);
        }
        Ok(result?)
    }

    /// Creates one note under a newly assigned id.
    ///
    /// Does not validate; callers run [`NoteService::validate`] first.
    pub fn create_one(&self, fields: NoteFields) -> Result<Note, NoteServiceError> {
        let started_at = Instant::now();
        match self.repo.create(fields) {
            Ok(note) => {
                info!(
                    "event=note_create module=service status=ok id={} duration_ms={}",
                    note.id,
                    started_at.elapsed().as_millis()
                );
                Ok(note)
            }
            Err(err) => {
                log_failure("note_create", None, &err);
                Err(err.into())
            }
        }
    }

    /// Shallow-merges `fields` into an existing note.
    pub fn update_one(&self, id: RecordId, fields: NoteFields) -> Result<Note, NoteServiceError> {
        let started_at = Instant::now();
        match self.repo.update(id, fields) {
            Ok(note) => {
                info!(
                    "event=note_update module=service status=ok id={} duration_ms={}",
                    id,
                    started_at.elapsed().as_millis()
                );
                Ok(note)
            }
            Err(err) => {
                log_failure("note_update", Some(id), &err);
                Err(err.into())
            }
        }
    }

    /// Deletes one note; absent ids succeed.
    pub fn delete_one(&self, id: RecordId) -> Result<(), NoteServiceError> {
        let started_at = Instant::now();
        match self.repo.delete(id) {
            Ok(removed) => {
                info!(
                    "event=note_delete module=service status=ok id={} removed={} duration_ms={}",
                    id,
                    removed,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                log_failure("note_delete", Some(id), &err);
                Err(err.into())
            }
        }
    }

    /// Validates form values; the report is empty when valid.
    pub fn validate(&self, fields: &NoteFields) -> ValidationReport {
        ValidationReport {
            issues: self.repo.validate(fields),
        }
    }
}

fn log_failure(event: &str, id: Option<RecordId>, err: &RepoError) {
    let error_code = match err {
        RepoError::NotFound(_) => "not_found",
        RepoError::Query(_) => "query_failed",
        RepoError::Storage(_) => "storage_failed",
        RepoError::InvalidData(_) => "invalid_data",
        RepoError::Poisoned(_) => "lock_poisoned",
    };
    match id {
        Some(id) => error!(
            "event={event} module=service status=error id={id} error_code={error_code} error={err}"
        ),
        None => error!("event={event} module=service status=error error_code={error_code} error={err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_record_id, NoteServiceError};

    #[test]
    fn record_id_parsing_accepts_integers_only() {
        assert_eq!(parse_record_id(" 12 ").unwrap(), 12);
        assert!(matches!(
            parse_record_id("twelve"),
            Err(NoteServiceError::InvalidId(_))
        ));
    }

    #[test]
    fn not_found_maps_to_note_not_found() {
        let err: NoteServiceError = crate::repo::record_repo::RepoError::NotFound(9).into();
        assert!(matches!(err, NoteServiceError::NoteNotFound(9)));
        assert_eq!(err.code(), "not_found");
    }
}
