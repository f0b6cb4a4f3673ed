//! Persistence backends for record snapshots.
//!
//! # Responsibility
//! - Define the `load()` / `save_all()` contract repositories persist through.
//! - Provide key-value media (memory, JSON files, SQLite) behind one trait.
//!
//! # Invariants
//! - A snapshot is the full collection serialized as one JSON array.
//! - `save_all` replaces the stored snapshot wholesale; there is no diffing.
//! - `load` returns `None` when nothing was ever stored under the key.

use crate::db::DbError;
use crate::model::record::Record;
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key used when no explicit storage key is configured.
pub const DEFAULT_STORAGE_KEY: &str = "notes";

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer error for backend I/O and snapshot encoding.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Io { path: PathBuf, source: std::io::Error },
    Serde(serde_json::Error),
    InvalidKey(String),
    /// A lock guarding backend state was poisoned by a panicking writer.
    Poisoned(&'static str),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::Serde(err) => write!(f, "invalid snapshot encoding: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key `{key}`"),
            Self::Poisoned(what) => write!(f, "{what} lock poisoned"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Serde(err) => Some(err),
            Self::InvalidKey(_) | Self::Poisoned(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Durable string key-value medium.
pub trait KeyValueStore: Send + Sync {
    /// Short medium name used in log events.
    fn kind(&self) -> &'static str;
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }
}

/// Snapshot persistence contract injected into repositories.
pub trait PersistenceBackend<R: Record>: Send + Sync {
    /// Loads the stored collection, or `None` when nothing was stored yet.
    fn load(&self) -> StorageResult<Option<Vec<R>>>;
    /// Replaces the stored collection with `records`.
    fn save_all(&self, records: &[R]) -> StorageResult<()>;
}

/// Stores the whole collection as one JSON array under a single key.
pub struct SnapshotBackend<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SnapshotBackend<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<R: Record, S: KeyValueStore> PersistenceBackend<R> for SnapshotBackend<S> {
    fn load(&self) -> StorageResult<Option<Vec<R>>> {
        let started_at = Instant::now();
        let Some(raw) = self.store.get(&self.key)? else {
            debug!(
                "event=snapshot_load module=storage status=ok store={} found=false",
                self.store.kind()
            );
            return Ok(None);
        };

        match serde_json::from_str::<Vec<R>>(&raw) {
            Ok(records) => {
                debug!(
                    "event=snapshot_load module=storage status=ok store={} found=true count={} bytes={} duration_ms={}",
                    self.store.kind(),
                    records.len(),
                    raw.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(Some(records))
            }
            Err(err) => {
                error!(
                    "event=snapshot_load module=storage status=error store={} error_code=snapshot_decode_failed error={}",
                    self.store.kind(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn save_all(&self, records: &[R]) -> StorageResult<()> {
        let started_at = Instant::now();
        let raw = serde_json::to_string(records)?;
        self.store.set(&self.key, &raw)?;
        debug!(
            "event=snapshot_save module=storage status=ok store={} count={} bytes={} duration_ms={}",
            self.store.kind(),
            records.len(),
            raw.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
