//! Record repository contract and snapshot-persisted implementation.
//!
//! # Responsibility
//! - Own the process-wide record collection behind the CRUD contract.
//! - Persist the full collection through an injected backend after each write.
//! - Run list queries against a consistent snapshot.
//!
//! # Invariants
//! - Record ids are unique within the collection at all times.
//! - New ids are `max(id) + 1`, or `1` for an empty collection.
//! - Writes are serialized; a write is published only after it persisted.
//! - Readers never observe a half-applied write.

use crate::model::record::{Record, RecordId, ValidationIssue};
use crate::query::engine::{QueryEngine, QueryError};
use crate::query::types::{ListQuery, Page};
use crate::storage::{PersistenceBackend, StorageError};
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for lookups, queries and persistence.
#[derive(Debug)]
pub enum RepoError {
    NotFound(RecordId),
    Query(QueryError),
    Storage(StorageError),
    /// Loaded or computed state violates a collection invariant.
    InvalidData(String),
    Poisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::Poisoned(what) => write!(f, "{what} lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::Poisoned(_) => None,
        }
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// CRUD contract over one record collection.
pub trait RecordRepository<R: Record>: Send + Sync {
    /// Filters, sorts and paginates the current collection.
    fn list(&self, query: &ListQuery) -> RepoResult<Page<R>>;
    /// Gets one record; `NotFound` when absent.
    fn get(&self, id: RecordId) -> RepoResult<R>;
    /// Inserts a record built from `draft` under a newly assigned id.
    fn create(&self, draft: R::Draft) -> RepoResult<R>;
    /// Shallow-merges `patch` into an existing record; `NotFound` when absent.
    fn update(&self, id: RecordId, patch: R::Patch) -> RepoResult<R>;
    /// Removes a record. Returns whether something was removed; absent ids
    /// are not an error.
    fn delete(&self, id: RecordId) -> RepoResult<bool>;
    /// Validates a draft without touching the collection.
    fn validate(&self, draft: &R::Draft) -> Vec<ValidationIssue> {
        R::validate_draft(draft)
    }
    /// Number of records currently stored.
    fn len(&self) -> RepoResult<usize>;

    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory collection persisted as whole snapshots.
///
/// Reads clone an `Arc` to the current collection and never wait for
/// persistence. Writes hold the write gate, build the next collection, save
/// it through the backend and then swap it in.
pub struct SnapshotRepository<R: Record, B: PersistenceBackend<R>> {
    backend: B,
    engine: QueryEngine,
    records: RwLock<Arc<Vec<R>>>,
    write_gate: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, B: PersistenceBackend<R>> SnapshotRepository<R, B> {
    /// Loads the persisted collection, or starts from `seed()` when the
    /// backend has nothing stored yet.
    ///
    /// The seed is not persisted until the first write.
    ///
    /// # Errors
    /// - Storage errors from `backend.load()`.
    /// - `InvalidData` when the loaded collection contains duplicate ids.
    pub fn open<F>(backend: B, engine: QueryEngine, seed: F) -> RepoResult<Self>
    where
        F: FnOnce() -> Vec<R>,
    {
        let (records, source) = match backend.load()? {
            Some(records) => (records, "stored"),
            None => (seed(), "seed"),
        };
        ensure_unique_ids(&records)?;

        info!(
            "event=repo_open module=repo status=ok source={} count={} filter_mode={:?}",
            source,
            records.len(),
            engine.mode()
        );

        Ok(Self {
            backend,
            engine,
            records: RwLock::new(Arc::new(records)),
            write_gate: Mutex::new(()),
            _record: PhantomData,
        })
    }

    /// Returns the current immutable snapshot of the whole collection.
    pub fn snapshot(&self) -> RepoResult<Arc<Vec<R>>> {
        let guard = self
            .records
            .read()
            .map_err(|_| RepoError::Poisoned("record snapshot"))?;
        Ok(Arc::clone(&guard))
    }

    fn lock_writes(&self) -> RepoResult<MutexGuard<'_, ()>> {
        self.write_gate
            .lock()
            .map_err(|_| RepoError::Poisoned("write gate"))
    }

    /// Persists `next` and publishes it. Must be called with the write gate held.
    fn commit(&self, next: Vec<R>) -> RepoResult<()> {
        self.backend.save_all(&next)?;
        let mut guard = self
            .records
            .write()
            .map_err(|_| RepoError::Poisoned("record snapshot"))?;
        *guard = Arc::new(next);
        Ok(())
    }
}

impl<R: Record, B: PersistenceBackend<R>> RecordRepository<R> for SnapshotRepository<R, B> {
    fn list(&self, query: &ListQuery) -> RepoResult<Page<R>> {
        let snapshot = self.snapshot()?;
        let page = self.engine.run(snapshot.as_slice(), query)?;
        debug!(
            "event=repo_list module=repo status=ok filters={} sort_keys={} returned={} total={}",
            query.filter.len(),
            query.sort.len(),
            page.items.len(),
            page.total_count
        );
        Ok(page)
    }

    fn get(&self, id: RecordId) -> RepoResult<R> {
        self.snapshot()?
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    fn create(&self, draft: R::Draft) -> RepoResult<R> {
        let _gate = self.lock_writes()?;
        let current = self.snapshot()?;
        let id = next_id(&current)?;
        let record = R::from_draft(id, draft);

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(record.clone());
        self.commit(next)?;

        Ok(record)
    }

    fn update(&self, id: RecordId, patch: R::Patch) -> RepoResult<R> {
        let _gate = self.lock_writes()?;
        let current = self.snapshot()?;
        let position = current
            .iter()
            .position(|record| record.id() == id)
            .ok_or(RepoError::NotFound(id))?;

        let mut next = current.to_vec();
        next[position].apply_patch(patch);
        if next[position].id() != id {
            return Err(RepoError::InvalidData(format!(
                "patch changed record id {id} to {}",
                next[position].id()
            )));
        }
        let updated = next[position].clone();
        self.commit(next)?;

        Ok(updated)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let _gate = self.lock_writes()?;
        let current = self.snapshot()?;
        if !current.iter().any(|record| record.id() == id) {
            info!("event=repo_delete module=repo status=ok removed=false id={id}");
            return Ok(false);
        }

        let next: Vec<R> = current
            .iter()
            .filter(|record| record.id() != id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    fn len(&self) -> RepoResult<usize> {
        Ok(self.snapshot()?.len())
    }
}

/// Returns `max(id) + 1`, or `1` for an empty collection.
pub fn next_id<R: Record>(records: &[R]) -> RepoResult<RecordId> {
    let max = records.iter().map(Record::id).max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| RepoError::InvalidData(format!("record id space exhausted at {max}")))
}

fn ensure_unique_ids<R: Record>(records: &[R]) -> RepoResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(RepoError::InvalidData(format!(
                "duplicate record id {} in stored collection",
                record.id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{next_id, RecordRepository, RepoError, SnapshotRepository};
    use crate::model::note::{default_notes, Note, NoteFields};
    use crate::query::engine::QueryEngine;
    use crate::storage::{MemoryStore, SnapshotBackend};

    fn open_seeded() -> SnapshotRepository<Note, SnapshotBackend<MemoryStore>> {
        let backend = SnapshotBackend::new(MemoryStore::new(), "notes");
        SnapshotRepository::open(backend, QueryEngine::default(), default_notes).unwrap()
    }

    #[test]
    fn next_id_starts_at_one_and_follows_max() {
        assert_eq!(next_id::<Note>(&[]).unwrap(), 1);
        let notes = vec![Note::new(7, "a", "b"), Note::new(3, "c", "d")];
        assert_eq!(next_id(&notes).unwrap(), 8);
    }

    #[test]
    fn seed_is_not_persisted_until_first_write() {
        let store = MemoryStore::new();
        let backend = SnapshotBackend::new(store.clone(), "notes");
        let repo = SnapshotRepository::open(backend, QueryEngine::default(), default_notes).unwrap();
        assert_eq!(repo.len().unwrap(), 2);
        assert!(store.is_empty().unwrap());

        repo.create(NoteFields::new("Third", "body")).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn delete_of_absent_id_is_a_no_op() {
        let repo = open_seeded();
        assert!(!repo.delete(42).unwrap());
        assert_eq!(repo.len().unwrap(), 2);
    }

    #[test]
    fn duplicate_stored_ids_are_rejected_on_open() {
        let backend = SnapshotBackend::new(MemoryStore::new(), "notes");
        let result = SnapshotRepository::open(backend, QueryEngine::default(), || {
            vec![Note::new(1, "a", "b"), Note::new(1, "c", "d")]
        });
        assert!(matches!(result, Err(RepoError::InvalidData(_))));
    }

    #[test]
    fn snapshot_taken_before_write_is_unaffected() {
        let repo = open_seeded();
        let before = repo.snapshot().unwrap();
        repo.update(1, NoteFields::default().with_title("Changed"))
            .unwrap();
        assert_eq!(before[0].title, "Grocery List Item");
        assert_eq!(repo.get(1).unwrap().title, "Changed");
    }
}
