//! Room manager: one task per open document
//!
//! The registry maps document names to room mailboxes and is the only
//! process-wide mutable state. Each room task owns its document outright;
//! sessions reach it exclusively through `RoomMsg`, so updates from
//! concurrent sessions are applied one at a time in arrival order.
//!
//! Room lifecycle: hydrate on first join, serve while sessions remain,
//! final flush after the last leave, then remove the registry entry. A join
//! that lands while the final flush runs revives the room instead of
//! spawning a duplicate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::persist::PersistenceBridge;
use crate::prelude::*;
use crate::protocol::{encode_frame, parse_frame, AwarenessUpdate, Frame};
use quillpad_crdt::codec::decode_state_vector;
use quillpad_crdt::{Awareness, TextDoc, UpdateError};

/// Process-unique id for one live connection.
pub type SessionId = u64;

/// Messages a room pushes to a session's send task.
#[derive(Debug, Clone)]
pub enum Outbound {
	/// Binary frame to forward to the peer.
	Frame(Vec<u8>),
	/// Close the connection (protocol violation).
	Disconnect,
}

/// A session as the room sees it: an id and a way to reach its socket.
#[derive(Debug, Clone)]
pub struct SessionHandle {
	pub id: SessionId,
	pub tx: mpsc::UnboundedSender<Outbound>,
}

/// Room mailbox messages.
#[derive(Debug)]
pub enum RoomMsg {
	Join(SessionHandle),
	Frame { session: SessionId, data: Vec<u8> },
	Leave(SessionId),
}

#[derive(Debug, Clone)]
pub struct RoomOptions {
	/// Dirty-check interval; edits are coalesced into at most one flush per
	/// tick.
	pub flush_interval: Duration,
}

impl Default for RoomOptions {
	fn default() -> Self {
		Self { flush_interval: Duration::from_secs(2) }
	}
}

/// The document-name → room map. Insertion and removal happen under one
/// lock, so two sessions joining the same name always land in the same room
/// and a room never disappears under a joiner.
#[derive(Debug)]
pub struct RoomRegistry {
	rooms: Mutex<HashMap<Box<str>, mpsc::UnboundedSender<RoomMsg>>>,
	bridge: PersistenceBridge,
	opts: RoomOptions,
	next_session: AtomicU64,
}

impl RoomRegistry {
	pub fn new(bridge: PersistenceBridge, opts: RoomOptions) -> Arc<Self> {
		Arc::new(Self {
			rooms: Mutex::new(HashMap::new()),
			bridge,
			opts,
			next_session: AtomicU64::new(1),
		})
	}

	/// Allocate an id for a new connection.
	pub fn next_session_id(&self) -> SessionId {
		self.next_session.fetch_add(1, Ordering::Relaxed)
	}

	/// Join `session` to the room for `doc_name`, spawning the room task if
	/// this is the first session. Returns the room's mailbox for the
	/// session's own frames.
	pub async fn join(
		self: &Arc<Self>,
		doc_name: &str,
		session: SessionHandle,
	) -> mpsc::UnboundedSender<RoomMsg> {
		let mut rooms = self.rooms.lock().await;
		if let Some(tx) = rooms.get(doc_name) {
			if tx.send(RoomMsg::Join(session.clone())).is_ok() {
				return tx.clone();
			}
		}

		let (tx, rx) = mpsc::unbounded_channel();
		rooms.insert(doc_name.into(), tx.clone());
		// The join is queued before the task starts; hydration drains it.
		let _ = tx.send(RoomMsg::Join(session));
		tokio::spawn(run_room(Arc::clone(self), doc_name.into(), rx));
		tx
	}

	/// Number of currently open rooms.
	pub async fn room_count(&self) -> usize {
		self.rooms.lock().await.len()
	}
}

struct Session {
	handle: SessionHandle,
	/// CRDT client id this session last announced via awareness; used to
	/// clear its presence on disconnect.
	awareness_client: Option<u64>,
}

struct Room {
	registry: Arc<RoomRegistry>,
	doc_name: Box<str>,
	doc: TextDoc,
	awareness: Awareness,
	sessions: HashMap<SessionId, Session>,
	dirty: bool,
}

async fn run_room(
	registry: Arc<RoomRegistry>,
	doc_name: Box<str>,
	mut rx: mpsc::UnboundedReceiver<RoomMsg>,
) {
	// Hydrating. Joins queue up in the mailbox meanwhile. Client id 0 is
	// fine for the room replica: it never makes local edits.
	let doc = match registry.bridge.hydrate(&doc_name).await {
		Ok(Some(bytes)) => match TextDoc::from_snapshot(0, &bytes) {
			Ok(doc) => doc,
			Err(err) => {
				warn!("Corrupt snapshot for {}, starting empty: {}", doc_name, err);
				TextDoc::new(0)
			}
		},
		Ok(None) => TextDoc::new(0),
		Err(err) => {
			warn!("Hydration failed for {}, starting empty: {}", doc_name, err);
			TextDoc::new(0)
		}
	};
	info!("Room opened: {}", doc_name);

	let mut room = Room {
		registry,
		doc_name,
		doc,
		awareness: Awareness::new(),
		sessions: HashMap::new(),
		dirty: false,
	};

	let mut flush_timer = tokio::time::interval(room.registry.opts.flush_interval);
	flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			msg = rx.recv() => {
				let Some(msg) = msg else { break };
				if room.handle_msg(msg, &mut rx).await {
					break;
				}
			}
			_ = flush_timer.tick() => {
				if room.dirty {
					room.flush().await;
				}
			}
		}
	}
}

impl Room {
	/// Process one mailbox message. Returns true when the room closed.
	async fn handle_msg(&mut self, msg: RoomMsg, rx: &mut mpsc::UnboundedReceiver<RoomMsg>) -> bool {
		match msg {
			RoomMsg::Join(handle) => {
				self.handle_join(handle);
				false
			}
			RoomMsg::Frame { session, data } => {
				self.handle_frame(session, &data);
				false
			}
			RoomMsg::Leave(id) => {
				if let Some(sess) = self.sessions.remove(&id) {
					debug!("Session {} left {}", id, self.doc_name);
					if let Some(client) = sess.awareness_client {
						self.clear_presence(client);
					}
				}
				if self.sessions.is_empty() {
					return self.drain_and_close(rx).await;
				}
				false
			}
		}
	}

	fn handle_join(&mut self, handle: SessionHandle) {
		// Initial sync: full snapshot plus everyone's current presence.
		let snapshot = self.doc.snapshot();
		let _ = handle.tx.send(Outbound::Frame(encode_frame(&Frame::SyncReply(snapshot))));
		for (client_id, state) in self.awareness.snapshot() {
			let frame = Frame::Awareness(AwarenessUpdate { client_id, state: Some(state) });
			let _ = handle.tx.send(Outbound::Frame(encode_frame(&frame)));
		}
		debug!("Session {} joined {} ({} present)", handle.id, self.doc_name, self.sessions.len());
		self.sessions.insert(handle.id, Session { handle, awareness_client: None });
	}

	fn handle_frame(&mut self, session: SessionId, data: &[u8]) {
		let frame = match parse_frame(data) {
			Ok(frame) => frame,
			Err(err) => {
				warn!("Bad frame from session {} in {}: {}", session, self.doc_name, err);
				self.disconnect(session);
				return;
			}
		};

		match frame {
			Frame::SyncRequest(sv_bytes) => match decode_state_vector(&sv_bytes) {
				Ok(sv) => {
					let reply = Frame::SyncReply(self.doc.diff(&sv));
					self.send_to(session, &encode_frame(&reply));
				}
				Err(err) => {
					warn!("Bad state vector from session {}: {}", session, err);
					self.disconnect(session);
				}
			},
			Frame::SyncReply(update) | Frame::Update(update) => {
				match self.doc.apply_update(&update) {
					Ok(()) => {
						self.dirty = true;
						self.broadcast_except(session, data);
					}
					Err(UpdateError::CausalGapTooLarge { pending }) => {
						// The incremental stream is beyond repair for this
						// peer; force a full resync.
						warn!(
							"Session {} in {} fell too far behind ({} buffered), resyncing",
							session, self.doc_name, pending
						);
						let reply = Frame::SyncReply(self.doc.snapshot());
						self.send_to(session, &encode_frame(&reply));
					}
					Err(err) => {
						warn!(
							"Malformed update from session {} in {}: {}",
							session, self.doc_name, err
						);
						self.disconnect(session);
					}
				}
			}
			Frame::Awareness(update) => {
				if let Some(sess) = self.sessions.get_mut(&session) {
					sess.awareness_client = Some(update.client_id);
				}
				match update.state.clone() {
					Some(state) => self.awareness.set(update.client_id, state),
					None => {
						self.awareness.clear(update.client_id);
					}
				}
				// Presence goes to everyone, the sender included.
				self.broadcast_all(data);
			}
		}
	}

	/// Final flush, then either close the room or revive it for a join that
	/// raced the shutdown. The registry lock is held across the decision so
	/// no joiner can observe a half-closed room.
	async fn drain_and_close(&mut self, rx: &mut mpsc::UnboundedReceiver<RoomMsg>) -> bool {
		self.flush().await;

		let registry = Arc::clone(&self.registry);
		let mut rooms = registry.rooms.lock().await;
		loop {
			match rx.try_recv() {
				Ok(RoomMsg::Join(handle)) => {
					drop(rooms);
					// Back to active; the completed flush stands.
					self.handle_join(handle);
					return false;
				}
				// Stragglers from sessions that are already gone.
				Ok(RoomMsg::Frame { .. } | RoomMsg::Leave(_)) => {}
				Err(_) => {
					rooms.remove(&*self.doc_name);
					info!("Room closed: {}", self.doc_name);
					return true;
				}
			}
		}
	}

	async fn flush(&mut self) {
		let snapshot = self.doc.snapshot();
		match self.registry.bridge.flush(&self.doc_name, &snapshot).await {
			Ok(()) => self.dirty = false,
			// Dirty stays set; the next tick retries with current state.
			Err(err) => warn!("Flush failed for {}: {}", self.doc_name, err),
		}
	}

	fn disconnect(&mut self, id: SessionId) {
		if let Some(sess) = self.sessions.remove(&id) {
			let _ = sess.handle.tx.send(Outbound::Disconnect);
			if let Some(client) = sess.awareness_client {
				self.clear_presence(client);
			}
		}
	}

	fn clear_presence(&mut self, client_id: u64) {
		if self.awareness.clear(client_id) {
			let frame = Frame::Awareness(AwarenessUpdate { client_id, state: None });
			self.broadcast_all(&encode_frame(&frame));
		}
	}

	fn send_to(&self, id: SessionId, data: &[u8]) {
		if let Some(sess) = self.sessions.get(&id) {
			let _ = sess.handle.tx.send(Outbound::Frame(data.to_vec()));
		}
	}

	fn broadcast_except(&self, skip: SessionId, data: &[u8]) {
		for (id, sess) in &self.sessions {
			if *id != skip {
				let _ = sess.handle.tx.send(Outbound::Frame(data.to_vec()));
			}
		}
	}

	fn broadcast_all(&self, data: &[u8]) {
		for sess in self.sessions.values() {
			let _ = sess.handle.tx.send(Outbound::Frame(data.to_vec()));
		}
	}
}

// vim: ts=4
