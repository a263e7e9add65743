//! Basic snapshot store operation tests

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use quillpad::store_adapter::StoreAdapter;
use quillpad_store_adapter_redb::StoreAdapterRedb;
use tempfile::TempDir;

async fn create_test_adapter() -> (StoreAdapterRedb, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = StoreAdapterRedb::new(temp_dir.path().join("snapshots.db"))
		.await
		.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_put_get_roundtrip() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.put("doc1", &[0x01, 0x02, 0x03]).await.expect("Failed to store snapshot");

	let snapshot = adapter.get("doc1").await.expect("Failed to read snapshot");
	assert_eq!(snapshot, Some(vec![0x01, 0x02, 0x03]));
}

#[tokio::test]
async fn test_absent_key() {
	let (adapter, _temp) = create_test_adapter().await;

	assert_eq!(adapter.get("nonexistent").await.unwrap(), None);
	assert!(!adapter.exists("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_overwrite_replaces_snapshot() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.put("doc1", &[1, 1, 1]).await.unwrap();
	adapter.put("doc1", &[2, 2]).await.unwrap();

	assert_eq!(adapter.get("doc1").await.unwrap(), Some(vec![2, 2]));
}

#[tokio::test]
async fn test_exists_after_put() {
	let (adapter, _temp) = create_test_adapter().await;

	assert!(!adapter.exists("doc1").await.unwrap());
	adapter.put("doc1", b"snapshot").await.unwrap();
	assert!(adapter.exists("doc1").await.unwrap());
}

#[tokio::test]
async fn test_empty_snapshot_allowed() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.put("doc1", &[]).await.unwrap();
	assert_eq!(adapter.get("doc1").await.unwrap(), Some(Vec::new()));
	assert!(adapter.exists("doc1").await.unwrap());
}

#[tokio::test]
async fn test_reopen_preserves_data() {
	let temp_dir = TempDir::new().unwrap();
	let path = temp_dir.path().join("snapshots.db");

	{
		let adapter = StoreAdapterRedb::new(&path).await.unwrap();
		adapter.put("doc1", b"durable").await.unwrap();
	}

	let adapter = StoreAdapterRedb::new(&path).await.unwrap();
	assert_eq!(adapter.get("doc1").await.unwrap(), Some(b"durable".to_vec()));
}

// vim: ts=4
