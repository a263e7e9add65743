//! Redb-based snapshot store adapter
//!
//! Implements the StoreAdapter trait over a single redb file, storing one
//! binary CRDT snapshot per document name. Upserts are atomic single-key
//! transactions, which is all the persistence bridge requires.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{ReadableDatabase, ReadableTable};
use tracing::{debug, trace};

use quillpad::error::{Error as QpError, QpResult};
use quillpad::store_adapter::StoreAdapter;

mod error;
pub use error::Error;

// Storage table definitions
mod tables {
	use redb::TableDefinition;

	/// Stores document snapshots: doc_name -> snapshot bytes
	pub const TABLE_SNAPSHOTS: TableDefinition<&str, &[u8]> =
		TableDefinition::new("doc_snapshots");
}

use tables::*;

/// Snapshot store using redb
pub struct StoreAdapterRedb {
	db_path: PathBuf,
	db: Arc<redb::Database>,
}

impl StoreAdapterRedb {
	/// Open (or create) the snapshot database at `db_path`. The parent
	/// directory is created if missing.
	pub async fn new(db_path: impl AsRef<Path>) -> QpResult<Self> {
		let db_path = db_path.as_ref().to_path_buf();
		if let Some(parent) = db_path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| {
				QpError::from(Error::IoError(format!("Failed to create storage directory: {}", e)))
			})?;
		}

		debug!("Opening snapshot store at {:?}", db_path);
		let db = redb::Database::create(&db_path)
			.map_err(|e| QpError::from(Error::DbError(format!("Failed to open database: {}", e))))?;

		// Create the table up front so reads on a fresh file succeed.
		let tx = db.begin_write().map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to begin write transaction: {}", e)))
		})?;
		let _ = tx.open_table(TABLE_SNAPSHOTS);
		tx.commit().map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to commit table creation: {}", e)))
		})?;

		Ok(Self { db_path, db: Arc::new(db) })
	}
}

#[async_trait::async_trait]
impl StoreAdapter for StoreAdapterRedb {
	async fn get(&self, doc_name: &str) -> QpResult<Option<Vec<u8>>> {
		let tx = self.db.begin_read().map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to begin read transaction: {}", e)))
		})?;
		let table = tx.open_table(TABLE_SNAPSHOTS).map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to open snapshots table: {}", e)))
		})?;

		let snapshot = table
			.get(doc_name)
			.map_err(|e| QpError::from(Error::DbError(format!("Failed to read snapshot: {}", e))))?
			.map(|value| value.value().to_vec());

		trace!(
			"Snapshot get {}: {}",
			doc_name,
			snapshot.as_ref().map_or("absent".to_string(), |s| format!("{} bytes", s.len()))
		);
		Ok(snapshot)
	}

	async fn put(&self, doc_name: &str, snapshot: &[u8]) -> QpResult<()> {
		let tx = self.db.begin_write().map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to begin write transaction: {}", e)))
		})?;
		{
			let mut table = tx.open_table(TABLE_SNAPSHOTS).map_err(|e| {
				QpError::from(Error::DbError(format!("Failed to open snapshots table: {}", e)))
			})?;
			table.insert(doc_name, snapshot).map_err(|e| {
				QpError::from(Error::DbError(format!("Failed to insert snapshot: {}", e)))
			})?;
		}
		tx.commit().map_err(|e| {
			QpError::from(Error::DbError(format!("Failed to commit snapshot: {}", e)))
		})?;

		trace!("Snapshot put {}: {} bytes", doc_name, snapshot.len());
		Ok(())
	}

	async fn exists(&self, doc_name: &str) -> QpResult<bool> {
		Ok(self.get(doc_name).await?.is_some())
	}
}

impl std::fmt::Debug for StoreAdapterRedb {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StoreAdapterRedb").field("db_path", &self.db_path).finish()
	}
}

// vim: ts=4
