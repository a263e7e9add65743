//! Error types for update decoding and merging

use std::fmt;

/// Errors produced while decoding or merging a binary update.
///
/// These are session-scoped: the room disconnects the sender on
/// `Malformed` and forces a full resync on `CausalGapTooLarge`, but the
/// document itself stays intact in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
	/// Corrupt or truncated binary delta.
	Malformed(&'static str),

	/// The buffered backlog of out-of-order updates exceeded its bound.
	/// The only way forward is a full snapshot resync.
	CausalGapTooLarge { pending: usize },

	/// A local edit addressed a character offset past the end of the
	/// materialized text.
	InvalidPosition { pos: u64, len: u64 },
}

impl fmt::Display for UpdateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UpdateError::Malformed(msg) => write!(f, "malformed update: {}", msg),
			UpdateError::CausalGapTooLarge { pending } => {
				write!(f, "causal gap too large: {} updates buffered", pending)
			}
			UpdateError::InvalidPosition { pos, len } => {
				write!(f, "position {} out of bounds (text length {})", pos, len)
			}
		}
	}
}

impl std::error::Error for UpdateError {}

// vim: ts=4
