//! Ephemeral presence state, tracked per room alongside the document
//!
//! Awareness never touches the document history and is never persisted.
//! Each connected client publishes at most one state; clearing it (or
//! disconnecting) removes the entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Presence state published by a single client (cursor position, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwarenessState {
	/// User display name
	pub user: String,
	/// Cursor position (line, column)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cursor: Option<(u32, u32)>,
	/// Text selection (start, end)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selection: Option<(u32, u32)>,
	/// User display color
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Last update timestamp (ms since epoch, client-supplied)
	pub timestamp: u64,
}

/// Map of currently known presence states, keyed by client id.
#[derive(Debug, Default, Clone)]
pub struct Awareness {
	states: HashMap<u64, AwarenessState>,
}

impl Awareness {
	pub fn new() -> Self {
		Self { states: HashMap::new() }
	}

	/// Record or replace the state for `client`.
	pub fn set(&mut self, client: u64, state: AwarenessState) {
		self.states.insert(client, state);
	}

	/// Drop the state for `client`. Returns true if an entry was removed.
	pub fn clear(&mut self, client: u64) -> bool {
		self.states.remove(&client).is_some()
	}

	pub fn get(&self, client: u64) -> Option<&AwarenessState> {
		self.states.get(&client)
	}

	/// All current entries, for replay to a freshly joined session.
	pub fn snapshot(&self) -> Vec<(u64, AwarenessState)> {
		let mut entries: Vec<_> =
			self.states.iter().map(|(&client, state)| (client, state.clone())).collect();
		entries.sort_by_key(|(client, _)| *client);
		entries
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}
}


// vim: ts=4
