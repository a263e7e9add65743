//! Binary wire protocol for document sessions
//!
//! Every frame is a binary WebSocket message: one frame-type byte followed
//! by the payload. Sync frames carry a second subtype byte:
//!
//! ```text
//! [0x00] [0x00] [state vector bytes]   sync step 1 (client announces state)
//! [0x00] [0x01] [update bytes]         sync step 2 (snapshot / diff reply)
//! [0x00] [0x02] [update bytes]         incremental update
//! [0x01] [json]                        awareness: { "clientId", "state" }
//! ```
//!
//! The CRDT payloads stay opaque bytes here; decoding them is the document's
//! job, so a malformed payload is attributed to the session that sent it.

use serde::{Deserialize, Serialize};
use std::fmt;

use quillpad_crdt::AwarenessState;

/// Frame type tag, first byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
	/// Document synchronization (state vectors, snapshots, updates)
	Sync = 0,
	/// Presence (cursor, identity) message
	Awareness = 1,
}

impl FrameType {
	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(FrameType::Sync),
			1 => Some(FrameType::Awareness),
			_ => None,
		}
	}

	pub fn as_u8(self) -> u8 {
		self as u8
	}
}

const SYNC_STEP1: u8 = 0;
const SYNC_STEP2: u8 = 1;
const SYNC_UPDATE: u8 = 2;

/// A decoded inbound or outbound session frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	/// Peer announces its state vector; the reply is a `SyncReply` diff.
	SyncRequest(Vec<u8>),
	/// Full snapshot or diff answering a `SyncRequest` (or forcing a resync).
	SyncReply(Vec<u8>),
	/// Incremental document update to apply and rebroadcast.
	Update(Vec<u8>),
	/// Presence change for one client.
	Awareness(AwarenessUpdate),
}

/// Awareness payload: `state: None` clears the client's presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwarenessUpdate {
	pub client_id: u64,
	pub state: Option<AwarenessState>,
}

/// Frame-level protocol violations. All of them are grounds for
/// disconnecting the offending session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
	Empty,
	UnknownFrameType(u8),
	UnknownSyncType(u8),
	BadAwarenessPayload,
}

impl fmt::Display for FrameError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FrameError::Empty => write!(f, "empty frame"),
			FrameError::UnknownFrameType(t) => write!(f, "unknown frame type: {}", t),
			FrameError::UnknownSyncType(t) => write!(f, "unknown sync subtype: {}", t),
			FrameError::BadAwarenessPayload => write!(f, "awareness payload is not valid JSON"),
		}
	}
}

impl std::error::Error for FrameError {}

/// Encode a frame into a binary WebSocket payload.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
	match frame {
		Frame::SyncRequest(sv) => {
			let mut buf = Vec::with_capacity(sv.len() + 2);
			buf.push(FrameType::Sync.as_u8());
			buf.push(SYNC_STEP1);
			buf.extend_from_slice(sv);
			buf
		}
		Frame::SyncReply(update) => {
			let mut buf = Vec::with_capacity(update.len() + 2);
			buf.push(FrameType::Sync.as_u8());
			buf.push(SYNC_STEP2);
			buf.extend_from_slice(update);
			buf
		}
		Frame::Update(update) => {
			let mut buf = Vec::with_capacity(update.len() + 2);
			buf.push(FrameType::Sync.as_u8());
			buf.push(SYNC_UPDATE);
			buf.extend_from_slice(update);
			buf
		}
		Frame::Awareness(update) => {
			let mut buf = vec![FrameType::Awareness.as_u8()];
			if let Ok(json) = serde_json::to_vec(update) {
				buf.extend_from_slice(&json);
			}
			buf
		}
	}
}

/// Parse a binary WebSocket payload into a frame.
pub fn parse_frame(data: &[u8]) -> Result<Frame, FrameError> {
	let (&tag, rest) = data.split_first().ok_or(FrameError::Empty)?;
	match FrameType::from_u8(tag).ok_or(FrameError::UnknownFrameType(tag))? {
		FrameType::Sync => {
			let (&subtype, payload) = rest.split_first().ok_or(FrameError::Empty)?;
			match subtype {
				SYNC_STEP1 => Ok(Frame::SyncRequest(payload.to_vec())),
				SYNC_STEP2 => Ok(Frame::SyncReply(payload.to_vec())),
				SYNC_UPDATE => Ok(Frame::Update(payload.to_vec())),
				other => Err(FrameError::UnknownSyncType(other)),
			}
		}
		FrameType::Awareness => {
			let update = serde_json::from_slice::<AwarenessUpdate>(rest)
				.map_err(|_| FrameError::BadAwarenessPayload)?;
			Ok(Frame::Awareness(update))
		}
	}
}


// vim: ts=4
