//! Replicated text document
//!
//! An RGA-style sequence CRDT over character runs. Every inserted run is
//! anchored to the identity of the character to its left at insertion time
//! (or to the document start), so concurrent remote edits can never corrupt
//! a previously issued local position. Deleted runs become tombstones and
//! are retained for causality; the state vector tracks the next unseen
//! clock per client.
//!
//! Convergence hinges on one rule applied identically on every replica:
//! runs inserted concurrently at the same anchor are ordered by descending
//! `(client, clock)`. Local edits are integrated through the exact same
//! code path as remote ones, so a replica always agrees with the deltas it
//! hands out.

use crate::codec::{self, DeleteRange, ItemId, StateVector, Update, WireItem};
use crate::error::UpdateError;

/// Upper bound on buffered out-of-order items and delete ranges. Past this
/// the document reports `CausalGapTooLarge` and expects a full resync.
pub const MAX_PENDING: usize = 1024;

/// One integrated run of characters. Runs split when a remote edit lands
/// in their middle; a split never changes merge semantics because the right
/// half is re-anchored to its immediate left character.
#[derive(Debug, Clone)]
struct Item {
	id: ItemId,
	origin: Option<ItemId>,
	content: Box<str>,
	/// Character count of `content` (cached; content is UTF-8).
	len: u64,
	deleted: bool,
}

impl Item {
	fn contains_clock(&self, id: ItemId) -> bool {
		self.id.client == id.client
			&& self.id.clock <= id.clock
			&& id.clock < self.id.clock + self.len
	}
}

enum Integration {
	Done,
	Deferred(WireItem),
}

enum DeleteOutcome {
	Done,
	/// The still-unknown tail of a range whose known prefix was applied.
	Deferred(DeleteRange),
}

/// A replicated text document.
pub struct TextDoc {
	client: u64,
	clock: u64,
	items: Vec<Item>,
	state: StateVector,
	pending_items: Vec<WireItem>,
	pending_deletes: Vec<DeleteRange>,
}

impl TextDoc {
	/// Create an empty document. `client` must be unique among all live
	/// replicas of the same document.
	pub fn new(client: u64) -> Self {
		Self {
			client,
			clock: 0,
			items: Vec::new(),
			state: StateVector::new(),
			pending_items: Vec::new(),
			pending_deletes: Vec::new(),
		}
	}

	/// Create a document seeded with `text` via a single bulk insert.
	/// This is the upload path: the returned document's snapshot is the
	/// initial durable state of a freshly created pad.
	pub fn with_text(client: u64, text: &str) -> Self {
		let mut doc = Self::new(client);
		if !text.is_empty() {
			// A fresh document cannot fail position 0 insertion.
			let _ = doc.insert_text(0, text);
		}
		doc
	}

	/// Reconstruct a document from a snapshot produced by [`snapshot`].
	pub fn from_snapshot(client: u64, snapshot: &[u8]) -> Result<Self, UpdateError> {
		let mut doc = Self::new(client);
		doc.apply_update(snapshot)?;
		Ok(doc)
	}

	pub fn client(&self) -> u64 {
		self.client
	}

	/// The per-client clock summary of everything merged so far.
	pub fn state_vector(&self) -> StateVector {
		self.state.clone()
	}

	pub fn encode_state_vector(&self) -> Vec<u8> {
		codec::encode_state_vector(&self.state)
	}

	/// Number of visible (non-tombstoned) characters.
	pub fn len(&self) -> u64 {
		self.items.iter().filter(|i| !i.deleted).map(|i| i.len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Materialize the current text. O(visible length).
	pub fn materialized_text(&self) -> String {
		let mut out = String::new();
		for item in &self.items {
			if !item.deleted {
				out.push_str(&item.content);
			}
		}
		out
	}

	/// Insert `text` at visible character offset `pos`, returning the
	/// encoded delta to broadcast.
	pub fn insert_text(&mut self, pos: u64, text: &str) -> Result<Vec<u8>, UpdateError> {
		if text.is_empty() {
			return Ok(codec::encode_update(&Update::default()));
		}
		let origin = self.origin_at(pos)?;
		let wire = WireItem {
			id: ItemId::new(self.client, self.clock),
			origin,
			content: text.to_string(),
		};
		self.clock += text.chars().count() as u64;
		let update = Update { items: vec![wire.clone()], deletes: Vec::new() };
		match self.try_integrate_item(wire)? {
			Integration::Done => {}
			Integration::Deferred(_) => {
				// Unreachable: a local insert's origin exists and its clock
				// is contiguous by construction.
				return Err(UpdateError::Malformed("local insert deferred"));
			}
		}
		Ok(codec::encode_update(&update))
	}

	/// Delete `len` visible characters starting at offset `pos`, returning
	/// the encoded delta to broadcast.
	pub fn delete_range(&mut self, pos: u64, len: u64) -> Result<Vec<u8>, UpdateError> {
		let visible = self.len();
		if pos + len > visible {
			return Err(UpdateError::InvalidPosition { pos: pos + len, len: visible });
		}
		if len == 0 {
			return Ok(codec::encode_update(&Update::default()));
		}

		// Collect (item index, char offset, char count) spans over the
		// visible range first, then apply back to front so indices stay
		// valid across splits.
		let mut spans: Vec<(usize, u64, u64)> = Vec::new();
		let mut acc = 0u64;
		let mut remaining = len;
		for (idx, item) in self.items.iter().enumerate() {
			if item.deleted {
				continue;
			}
			if remaining == 0 {
				break;
			}
			let start = acc;
			let end = acc + item.len;
			acc = end;
			if end <= pos {
				continue;
			}
			let off = pos.saturating_sub(start);
			let take = (item.len - off).min(remaining);
			spans.push((idx, off, take));
			remaining -= take;
		}

		let mut deletes = Vec::new();
		for &(idx, off, take) in spans.iter().rev() {
			let (client, clock) = {
				let item = &self.items[idx];
				(item.id.client, item.id.clock + off)
			};
			if off + take < self.items[idx].len {
				self.split_item(idx, off + take);
			}
			let target = if off > 0 {
				self.split_item(idx, off);
				idx + 1
			} else {
				idx
			};
			self.items[target].deleted = true;
			deletes.push(DeleteRange { client, clock, len: take });
		}
		deletes.reverse();
		Ok(codec::encode_update(&Update { items: Vec::new(), deletes }))
	}

	/// Decode and merge a remote delta.
	///
	/// Safe to call with duplicates (no-op), with deltas whose causal
	/// predecessors are missing (buffered until they arrive, bounded by
	/// [`MAX_PENDING`]), and with deltas from unknown clients (accepted).
	pub fn apply_update(&mut self, bytes: &[u8]) -> Result<(), UpdateError> {
		let update = codec::decode_update(bytes)?;
		self.integrate(update)
	}

	/// Full-state encoding: an update against the empty state vector,
	/// suitable for persistence or a fresh peer's initial sync.
	pub fn snapshot(&self) -> Vec<u8> {
		self.diff(&StateVector::new())
	}

	/// Encode every edit the remote peer has not seen yet. Runs the remote
	/// has partially seen are sent whole; the receiver trims the known
	/// prefix. Delete ranges are always sent in full (applying them again
	/// is a no-op).
	pub fn diff(&self, remote: &StateVector) -> Vec<u8> {
		let mut update = Update::default();
		for item in &self.items {
			if item.id.clock + item.len > remote.get(item.id.client) {
				update.items.push(WireItem {
					id: item.id,
					origin: item.origin,
					content: item.content.to_string(),
				});
			}
			if item.deleted {
				update.deletes.push(DeleteRange {
					client: item.id.client,
					clock: item.id.clock,
					len: item.len,
				});
			}
		}
		codec::encode_update(&update)
	}

	fn integrate(&mut self, update: Update) -> Result<(), UpdateError> {
		let mut queue_items: Vec<WireItem> = std::mem::take(&mut self.pending_items);
		queue_items.extend(update.items);
		let mut queue_deletes: Vec<DeleteRange> = std::mem::take(&mut self.pending_deletes);
		queue_deletes.extend(update.deletes);

		// Iterate to a fixpoint: integrating one run can unblock others
		// that were waiting on it (same-client continuity or origin).
		let mut progress = true;
		while progress {
			progress = false;

			let mut deferred_items = Vec::new();
			for wire in queue_items.drain(..) {
				match self.try_integrate_item(wire)? {
					Integration::Done => progress = true,
					Integration::Deferred(wire) => deferred_items.push(wire),
				}
			}
			queue_items = deferred_items;

			let mut deferred_deletes = Vec::new();
			for del in queue_deletes.drain(..) {
				match self.try_apply_delete(del) {
					DeleteOutcome::Done => progress = true,
					DeleteOutcome::Deferred(rest) => deferred_deletes.push(rest),
				}
			}
			queue_deletes = deferred_deletes;
		}

		self.pending_items = queue_items;
		self.pending_deletes = queue_deletes;

		let pending = self.pending_items.len() + self.pending_deletes.len();
		if pending > MAX_PENDING {
			// Abandon the backlog. The caller answers this error with a full
			// resync, which carries everything the buffered runs carried;
			// keeping them would charge the gap to every later update.
			self.pending_items.clear();
			self.pending_deletes.clear();
			return Err(UpdateError::CausalGapTooLarge { pending });
		}
		Ok(())
	}

	fn try_integrate_item(&mut self, mut wire: WireItem) -> Result<Integration, UpdateError> {
		let wire_len = wire.content.chars().count() as u64;
		let seen = self.state.get(wire.id.client);

		if wire.id.clock + wire_len <= seen {
			// Strict subset of already-applied history.
			return Ok(Integration::Done);
		}
		if wire.id.clock > seen {
			// Same-client predecessor missing.
			return Ok(Integration::Deferred(wire));
		}
		if wire.id.clock < seen {
			// Partially known run: trim the seen prefix and re-anchor the
			// remainder to its immediate left character.
			let skip = seen - wire.id.clock;
			let byte_off = char_to_byte(&wire.content, skip)?;
			wire.content = wire.content[byte_off..].to_string();
			wire.origin = Some(ItemId::new(wire.id.client, seen - 1));
			wire.id.clock = seen;
		}
		if let Some(origin) = wire.origin {
			if origin.clock >= self.state.get(origin.client) {
				// Anchor character not merged yet.
				return Ok(Integration::Deferred(wire));
			}
		}

		self.place(wire)?;
		Ok(Integration::Done)
	}

	/// Insert a run at its converged position.
	fn place(&mut self, wire: WireItem) -> Result<(), UpdateError> {
		let len = wire.content.chars().count() as u64;

		// Split the anchor run so the origin character ends a run, then
		// scan forward applying the ordering rule: stop before any run
		// anchored earlier than ours, or before a same-anchor sibling with
		// a smaller (client, clock).
		let anchor_idx = match wire.origin {
			None => None,
			Some(origin) => {
				let (idx, off) =
					self.find_char(origin).ok_or(UpdateError::Malformed("unknown origin"))?;
				if off + 1 < self.items[idx].len {
					self.split_item(idx, off + 1);
				}
				Some(idx)
			}
		};

		let my_origin_pos = anchor_idx.map(|idx| (idx, self.items[idx].len - 1));
		let mut i = anchor_idx.map_or(0, |idx| idx + 1);
		while i < self.items.len() {
			let other = &self.items[i];
			let other_origin_pos = match other.origin {
				None => None,
				Some(o) => self.find_char(o),
			};
			if other_origin_pos < my_origin_pos {
				break;
			}
			if other_origin_pos == my_origin_pos
				&& (other.id.client, other.id.clock) < (wire.id.client, wire.id.clock)
			{
				break;
			}
			i += 1;
		}

		self.items.insert(
			i,
			Item {
				id: wire.id,
				origin: wire.origin,
				len,
				content: wire.content.into_boxed_str(),
				deleted: false,
			},
		);
		self.state.observe(self.items[i].id.client, self.items[i].id.clock + len);
		Ok(())
	}

	fn try_apply_delete(&mut self, del: DeleteRange) -> DeleteOutcome {
		let seen = self.state.get(del.client);
		if del.clock >= seen {
			// Entirely unknown characters.
			return DeleteOutcome::Deferred(del);
		}
		let known_end = (del.clock + del.len).min(seen);
		self.mark_deleted(del.client, del.clock, known_end);
		if known_end < del.clock + del.len {
			return DeleteOutcome::Deferred(DeleteRange {
				client: del.client,
				clock: known_end,
				len: del.clock + del.len - known_end,
			});
		}
		DeleteOutcome::Done
	}

	/// Tombstone every character of `client` with clock in `[from, to)`.
	/// Idempotent: already-deleted runs stay deleted.
	fn mark_deleted(&mut self, client: u64, from: u64, to: u64) {
		let mut idx = 0;
		while idx < self.items.len() {
			let (start, end) = {
				let item = &self.items[idx];
				if item.id.client != client {
					idx += 1;
					continue;
				}
				(item.id.clock, item.id.clock + item.len)
			};
			let ov_start = start.max(from);
			let ov_end = end.min(to);
			if ov_start >= ov_end {
				idx += 1;
				continue;
			}
			if ov_start > start {
				// Deletion starts mid-run: split and revisit the right half.
				self.split_item(idx, ov_start - start);
				idx += 1;
				continue;
			}
			if ov_end < end {
				self.split_item(idx, ov_end - start);
			}
			self.items[idx].deleted = true;
			idx += 1;
		}
	}

	/// Split `items[idx]` at character offset `off` (0 < off < len). The
	/// right half keeps the run's tail clocks and anchors to its immediate
	/// left character, which preserves merge semantics exactly.
	fn split_item(&mut self, idx: usize, off: u64) {
		let (right_id, right_origin, right_content, right_len, deleted) = {
			let item = &self.items[idx];
			let byte_off = match char_to_byte(&item.content, off) {
				Ok(b) => b,
				Err(_) => return,
			};
			(
				ItemId::new(item.id.client, item.id.clock + off),
				Some(ItemId::new(item.id.client, item.id.clock + off - 1)),
				item.content[byte_off..].to_string().into_boxed_str(),
				item.len - off,
				item.deleted,
			)
		};
		{
			let item = &mut self.items[idx];
			let byte_off = item.content.len() - right_content.len();
			item.content = item.content[..byte_off].to_string().into_boxed_str();
			item.len = off;
		}
		self.items.insert(
			idx + 1,
			Item {
				id: right_id,
				origin: right_origin,
				content: right_content,
				len: right_len,
				deleted,
			},
		);
	}

	/// Locate the run and in-run offset holding a character id. Searches
	/// tombstones too.
	fn find_char(&self, id: ItemId) -> Option<(usize, u64)> {
		self.items
			.iter()
			.position(|item| item.contains_clock(id))
			.map(|idx| (idx, id.clock - self.items[idx].id.clock))
	}

	/// Identity of the visible character directly left of offset `pos`
	/// (`None` at the document start).
	fn origin_at(&self, pos: u64) -> Result<Option<ItemId>, UpdateError> {
		if pos == 0 {
			return Ok(None);
		}
		let mut acc = 0u64;
		for item in &self.items {
			if item.deleted {
				continue;
			}
			if acc + item.len >= pos {
				let off = pos - acc - 1;
				return Ok(Some(ItemId::new(item.id.client, item.id.clock + off)));
			}
			acc += item.len;
		}
		Err(UpdateError::InvalidPosition { pos, len: acc })
	}
}

fn char_to_byte(s: &str, off: u64) -> Result<usize, UpdateError> {
	if off == 0 {
		return Ok(0);
	}
	let off = usize::try_from(off).map_err(|_| UpdateError::Malformed("offset overflow"))?;
	if off == s.chars().count() {
		return Ok(s.len());
	}
	s.char_indices()
		.nth(off)
		.map(|(b, _)| b)
		.ok_or(UpdateError::Malformed("offset past content"))
}


// vim: ts=4
