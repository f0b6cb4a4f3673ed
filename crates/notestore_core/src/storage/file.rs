//! Directory-backed key-value store: one `<key>.json` file per key.
//!
//! # Invariants
//! - Keys are restricted to `[A-Za-z0-9_.-]` and never start with `.`.
//! - Writes go to a temp file in the same directory and are renamed into
//!   place, so readers never see a partially written snapshot.

use super::{KeyValueStore, StorageError, StorageResult};
use log::error;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

static STORAGE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*$").expect("valid storage key regex"));

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory when missing.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if !STORAGE_KEY_RE.is_match(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));

        let written = write_synced(&tmp_path, value)
            .and_then(|()| fs::rename(&tmp_path, &path))
            .and_then(|()| sync_dir(&self.dir));
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp_path);
            error!(
                "event=file_store_write module=storage status=error error_code=write_failed error={}",
                source
            );
            return Err(StorageError::Io { path, source });
        }
        Ok(())
    }
}

fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// Flushes the directory entry so the rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
