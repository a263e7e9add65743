//! Persistence bridge between rooms and the snapshot store
//!
//! Wraps the injected [`StoreAdapter`] with per-attempt timeouts and bounded
//! exponential backoff. Flushes for one document are already serialized by
//! its room task, so the bridge itself carries no locking.

use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use quillpad_types::store_adapter::StoreAdapter;

/// Retry/timeout policy for storage calls.
#[derive(Debug, Clone)]
pub struct PersistOptions {
	/// Per-attempt I/O timeout.
	pub op_timeout: Duration,
	/// Total attempts per call (first try included).
	pub attempts: u32,
	/// Backoff before the second attempt; doubles per retry.
	pub backoff: Duration,
}

impl Default for PersistOptions {
	fn default() -> Self {
		Self { op_timeout: Duration::from_secs(5), attempts: 3, backoff: Duration::from_millis(250) }
	}
}

/// Storage access for rooms: hydrate on first open, flush on dirty/close.
#[derive(Clone)]
pub struct PersistenceBridge {
	store: Arc<dyn StoreAdapter>,
	opts: PersistOptions,
}

impl std::fmt::Debug for PersistenceBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PersistenceBridge").field("opts", &self.opts).finish_non_exhaustive()
	}
}

impl PersistenceBridge {
	pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
		Self::with_options(store, PersistOptions::default())
	}

	pub fn with_options(store: Arc<dyn StoreAdapter>, opts: PersistOptions) -> Self {
		Self { store, opts }
	}

	/// Load the last durable snapshot for `doc_name`, or `None` for a brand
	/// new document. Retries transient failures; the caller decides how to
	/// degrade when all attempts fail.
	pub async fn hydrate(&self, doc_name: &str) -> QpResult<Option<Vec<u8>>> {
		let mut backoff = self.opts.backoff;
		let mut last_err = Error::Storage("no attempts made".into());
		for attempt in 1..=self.opts.attempts {
			match tokio::time::timeout(self.opts.op_timeout, self.store.get(doc_name)).await {
				Ok(Ok(snapshot)) => return Ok(snapshot),
				Ok(Err(err)) => {
					warn!("Hydrate attempt {} failed for {}: {}", attempt, doc_name, err);
					last_err = err;
				}
				Err(_) => {
					warn!("Hydrate attempt {} timed out for {}", attempt, doc_name);
					last_err = Error::Storage(format!("hydrate timeout for {}", doc_name));
				}
			}
			if attempt < self.opts.attempts {
				tokio::time::sleep(backoff).await;
				backoff *= 2;
			}
		}
		Err(last_err)
	}

	/// Idempotently upsert the full snapshot under `doc_name`. On total
	/// failure the caller keeps its dirty flag; the in-memory state is never
	/// discarded on a failed flush.
	pub async fn flush(&self, doc_name: &str, snapshot: &[u8]) -> QpResult<()> {
		let mut backoff = self.opts.backoff;
		let mut last_err = Error::Storage("no attempts made".into());
		for attempt in 1..=self.opts.attempts {
			match tokio::time::timeout(self.opts.op_timeout, self.store.put(doc_name, snapshot))
				.await
			{
				Ok(Ok(())) => {
					debug!("Flushed {} ({} bytes)", doc_name, snapshot.len());
					return Ok(());
				}
				Ok(Err(err)) => {
					warn!("Flush attempt {} failed for {}: {}", attempt, doc_name, err);
					last_err = err;
				}
				Err(_) => {
					warn!("Flush attempt {} timed out for {}", attempt, doc_name);
					last_err = Error::Storage(format!("flush timeout for {}", doc_name));
				}
			}
			if attempt < self.opts.attempts {
				tokio::time::sleep(backoff).await;
				backoff *= 2;
			}
		}
		Err(last_err)
	}
}

// vim: ts=4
