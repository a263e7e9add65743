//! Document Store Adapter
//!
//! Trait for pluggable snapshot storage backends. A document's durable
//! representation is a single binary CRDT snapshot blob keyed by its name;
//! the store only has to offer atomic single-key get/put/exists.
//!
//! Each adapter implementation provides its own constructor handling
//! backend-specific initialization (database path, connection settings, …).

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::QpResult;

/// Snapshot storage backend.
///
/// Implementations must make `put` an atomic upsert: a concurrent reader
/// sees either the previous snapshot or the new one, never a torn write.
/// The caller (the room task) already serializes writes per document name.
#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
	/// Read the last stored snapshot for a document.
	///
	/// Returns `None` for a document that has never been flushed.
	async fn get(&self, doc_name: &str) -> QpResult<Option<Vec<u8>>>;

	/// Idempotently upsert the full snapshot for a document.
	async fn put(&self, doc_name: &str, snapshot: &[u8]) -> QpResult<()>;

	/// Whether a snapshot exists for a document.
	async fn exists(&self, doc_name: &str) -> QpResult<bool>;
}

// vim: ts=4
