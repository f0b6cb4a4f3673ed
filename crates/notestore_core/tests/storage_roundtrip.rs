use notestore_core::{
    default_notes, open_note_service, CoreConfig, FileStore, FilterMode, ListQuery, Note,
    NoteFields, NoteServiceError, PersistenceBackend, QueryEngine, RecordRepository, RepoError,
    SnapshotBackend, SnapshotRepository, SqliteStore, StorageError, StorageKind,
};
use std::collections::HashSet;

fn config_for(storage: StorageKind, data_path: std::path::PathBuf) -> CoreConfig {
    CoreConfig {
        storage,
        data_path,
        ..CoreConfig::default()
    }
}

fn all_notes_query() -> ListQuery {
    ListQuery::new().page(0, 1_000)
}

#[test]
fn file_store_round_trip_returns_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(StorageKind::File, dir.path().join("data"));

    let expected: HashSet<(i64, String)> = {
        let service = open_note_service(&config).unwrap();
        service.create_one(NoteFields::new("Third", "c")).unwrap();
        service.create_one(NoteFields::new("Fourth", "d")).unwrap();
        service.delete_one(2).unwrap();
        service
            .get_many(&all_notes_query())
            .unwrap()
            .items
            .into_iter()
            .map(|note| (note.id, note.title))
            .collect()
    };

    let reloaded = open_note_service(&config).unwrap();
    let page = reloaded.get_many(&all_notes_query()).unwrap();
    let actual: HashSet<(i64, String)> = page
        .items
        .into_iter()
        .map(|note| (note.id, note.title))
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(page.total_count, 3);
    assert!(dir.path().join("data").join("notes.json").exists());
}

#[test]
fn sqlite_store_round_trip_returns_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(StorageKind::Sqlite, dir.path().join("notes.db"));

    {
        let service = open_note_service(&config).unwrap();
        service
            .update_one(1, NoteFields::default().with_text("Buy less coffee."))
            .unwrap();
    }

    let reloaded = open_note_service(&config).unwrap();
    assert_eq!(reloaded.get_one(1).unwrap().text, "Buy less coffee.");
    assert_eq!(reloaded.get_many(&all_notes_query()).unwrap().total_count, 2);
}

#[test]
fn memory_storage_starts_from_seed_every_time() {
    let config = config_for(StorageKind::Memory, Default::default());
    let first = open_note_service(&config).unwrap();
    first.delete_one(1).unwrap();

    let second = open_note_service(&config).unwrap();
    assert_eq!(second.repo().len().unwrap(), default_notes().len());
}

#[test]
fn storage_key_separates_collections_in_one_medium() {
    let dir = tempfile::tempdir().unwrap();
    let work = CoreConfig {
        storage_key: "work".to_string(),
        ..config_for(StorageKind::Sqlite, dir.path().join("shared.db"))
    };
    let home = CoreConfig {
        storage_key: "home".to_string(),
        ..work.clone()
    };

    open_note_service(&work)
        .unwrap()
        .create_one(NoteFields::new("Work only", "x"))
        .unwrap();

    let home_service = open_note_service(&home).unwrap();
    assert_eq!(home_service.repo().len().unwrap(), 2);
    assert_eq!(open_note_service(&work).unwrap().repo().len().unwrap(), 3);
}

#[test]
fn strict_config_surfaces_malformed_filters() {
    let config = CoreConfig {
        filter_mode: FilterMode::Strict,
        ..config_for(StorageKind::Memory, Default::default())
    };
    let service = open_note_service(&config).unwrap();

    let query: ListQuery = serde_json::from_value(serde_json::json!({
        "filter": [{ "field": "title", "operator": "contains", "value": null }]
    }))
    .unwrap();
    let err = service.get_many(&query).unwrap_err();
    assert_eq!(err.code(), "query_failed");
}

#[test]
fn failed_save_leaves_published_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let store = FileStore::open(&data_dir).unwrap();
    let backend = SnapshotBackend::new(store, "notes");
    let repo = SnapshotRepository::open(backend, QueryEngine::default(), default_notes).unwrap();

    // Replacing the directory with a plain file makes every save fail.
    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "occupied").unwrap();

    let err = repo.create(NoteFields::new("Lost", "write")).unwrap_err();
    assert!(matches!(err, RepoError::Storage(StorageError::Io { .. })));
    assert_eq!(repo.len().unwrap(), 2);
}

#[test]
fn corrupt_snapshot_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.json"), "not json").unwrap();
    let config = config_for(StorageKind::File, dir.path().to_path_buf());

    let err = open_note_service(&config).err().unwrap();
    assert!(matches!(
        err,
        NoteServiceError::Repo(RepoError::Storage(StorageError::Serde(_)))
    ));
}

#[test]
fn sqlite_backend_snapshot_is_readable_as_plain_json() {
    let store = SqliteStore::open_in_memory().unwrap();
    let backend = SnapshotBackend::new(store, "notes");
    backend.save_all(&default_notes()).unwrap();

    let loaded: Vec<Note> = backend.load().unwrap().unwrap();
    assert_eq!(loaded, default_notes());
}
