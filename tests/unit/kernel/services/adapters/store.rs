use super::*;
use crate::models::{Change, ChangeSetId, Content, VcsPath};

fn sample_journal() -> Vec<ChangeSet> {
    vec![
        ChangeSet {
            id: ChangeSetId(1),
            label: None,
            timestamp: 10,
            changes: vec![Change::CreateDirectory {
                path: VcsPath::new("/proj/src"),
            }],
        },
        ChangeSet {
            id: ChangeSetId(2),
            label: Some("Refactor".to_string()),
            timestamp: 20,
            changes: vec![Change::CreateFile {
                path: VcsPath::new("/proj/src/a.rs"),
                content: Content::from("fn main() {}"),
                timestamp: 20,
            }],
        },
    ]
}

#[test]
fn test_hash_roots_ignores_order() {
    let a = vec![PathBuf::from("/a"), PathBuf::from("/b")];
    let b = vec![PathBuf::from("/b"), PathBuf::from("/a")];
    let c = vec![PathBuf::from("/c")];

    assert_eq!(hash_roots(&a), hash_roots(&b));
    assert_ne!(hash_roots(&a), hash_roots(&c));
}

#[test]
fn test_hash_roots_is_stable() {
    let roots = vec![PathBuf::from("/b"), PathBuf::from("/a")];
    assert_eq!(hash_roots(&roots), "bf40d84a6186afb3");
}

#[test]
fn test_get_log_dir() {
    let Some(dir) = get_log_dir() else {
        return;
    };
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(LOG_DIR));
}

#[test]
fn test_default_journal_path() {
    let path = default_journal_path(&[PathBuf::from("/tmp/proj")]).unwrap();
    assert!(path.to_string_lossy().ends_with(".json"));
    assert!(path.to_string_lossy().contains(JOURNAL_DIR));
}

#[test]
fn test_missing_journal_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JournalStore::new(dir.path().join("none.json"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = JournalStore::new(dir.path().join("nested/journal.json"));
    let journal = sample_journal();

    store.save(&journal).unwrap();
    assert!(!dir.path().join("nested/journal.json.tmp").exists());
    assert_eq!(store.load().unwrap(), journal);
}

#[test]
fn test_unsupported_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.json");
    std::fs::write(&path, r#"{"version": 99, "change_sets": []}"#).unwrap();

    let err = JournalStore::new(path).load().unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedVersion(99)));
}

#[test]
fn test_malformed_journal_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(
        JournalStore::new(path).load(),
        Err(StoreError::Json(_))
    ));
}
