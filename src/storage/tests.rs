use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_local_load_missing_returns_none() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalIndexStore::new(dir.path().join("index.json"));

    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_local_save_then_load() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalIndexStore::new(dir.path().join("nested").join("index.json"));

    store.save(b"{\"a\":1}").await.unwrap();

    assert_eq!(store.load().await.unwrap().unwrap(), b"{\"a\":1}");
}

#[tokio::test]
async fn test_local_save_overwrites_and_leaves_no_temp_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("index.json");
    let store = LocalIndexStore::new(path.clone());

    store.save(b"first").await.unwrap();
    store.save(b"second version").await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"second version");

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 1, "unexpected files: {:?}", entries);
}

#[tokio::test]
async fn test_local_load_directory_is_io_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalIndexStore::new(dir.path());

    assert!(matches!(store.load().await, Err(StorageError::Io(_))));
}

#[tokio::test]
async fn test_memory_store_roundtrip_and_failure() {
    let store = MemoryIndexStore::new();
    assert!(store.load().await.unwrap().is_none());

    store.save(b"blob").await.unwrap();
    assert_eq!(store.load().await.unwrap().unwrap(), b"blob");
    assert_eq!(store.save_count(), 1);

    store.fail_io(true);
    assert!(store.load().await.is_err());
    assert!(store.save(b"x").await.is_err());
    assert_eq!(store.blob().unwrap(), b"blob");
}

#[test]
fn test_target_parse_gcs() {
    assert_eq!(
        StorageTarget::parse("gs://compliance/refs/index.json").unwrap(),
        StorageTarget::Gcs {
            bucket: "compliance".to_string(),
            object: "refs/index.json".to_string()
        }
    );
    assert_eq!(
        StorageTarget::parse("gs://compliance").unwrap(),
        StorageTarget::Gcs {
            bucket: "compliance".to_string(),
            object: crate::constants::DEFAULT_INDEX_FILENAME.to_string()
        }
    );
    assert_eq!(
        StorageTarget::parse("gs://compliance/").unwrap(),
        StorageTarget::Gcs {
            bucket: "compliance".to_string(),
            object: crate::constants::DEFAULT_INDEX_FILENAME.to_string()
        }
    );
}

#[test]
fn test_target_parse_local() {
    assert_eq!(
        StorageTarget::parse("local").unwrap(),
        StorageTarget::Local(std::path::PathBuf::from(
            crate::constants::DEFAULT_INDEX_FILENAME
        ))
    );
    assert_eq!(
        StorageTarget::parse("./data/idx.json").unwrap(),
        StorageTarget::Local(std::path::PathBuf::from("./data/idx.json"))
    );
}

#[test]
fn test_target_parse_invalid() {
    assert!(matches!(
        StorageTarget::parse("  "),
        Err(StorageError::InvalidTarget { .. })
    ));
    assert!(matches!(
        StorageTarget::parse("gs:///object"),
        Err(StorageError::InvalidTarget { .. })
    ));
}

#[test]
fn test_target_display_and_open() {
    let target = StorageTarget::parse("gs://b/o.json").unwrap();
    assert_eq!(target.to_string(), "gs://b/o.json");
    assert_eq!(target.open().location(), "gs://b/o.json");

    let local = StorageTarget::parse("idx.json").unwrap();
    assert_eq!(local.open().location(), "idx.json");
}

#[test]
fn test_gsutil_missing_object_detection() {
    assert!(gcs::is_missing_object(
        "CommandException: No URLs matched: gs://bucket/index.json"
    ));
    assert!(gcs::is_missing_object(
        "NotFoundException: 404 gs://bucket/index.json does not exist."
    ));
    assert!(!gcs::is_missing_object(
        "BucketNotFoundException: 404 gs://nope bucket does not exist."
    ));
    assert!(!gcs::is_missing_object(
        "ServiceException: 401 credentials not found"
    ));
    assert!(!gcs::is_missing_object("OSError: python3: command not found"));
}

#[tokio::test]
async fn test_gcs_unspawnable_gsutil_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = GcsIndexStore::new("bucket", "index.json")
        .with_gsutil_path(dir.path().join("no-such-gsutil"));

    assert_eq!(store.location(), "gs://bucket/index.json");
    assert!(matches!(store.load().await, Err(StorageError::Remote(_))));
    assert!(matches!(store.save(b"{}").await, Err(StorageError::Remote(_))));
}
