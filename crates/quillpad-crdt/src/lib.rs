//! Replicated text document for collaborative editing.
//!
//! This crate is pure data structure code: no I/O, no transport. It provides
//! the binary update codec, the merge algorithm, and the ephemeral presence
//! map. The sync layer (`quillpad-sync`) owns every instance and serializes
//! access per room.
//!
//! Update Format (Binary):
//! ```text
//! [item_count: varint]
//!   per item: [client] [clock] [origin_flag: u8]
//!             [origin_client] [origin_clock]   (only when origin_flag = 1)
//!             [content_len: varint] [content: utf-8 bytes]
//! [delete_count: varint]
//!   per range: [client] [clock] [len]
//! ```
//! All integers are LEB128 varints. Decoding is hardened against truncated
//! and adversarial input: length fields are bounds-checked against the
//! remaining buffer and never drive preallocation.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod awareness;
pub mod codec;
pub mod doc;
pub mod error;

pub use awareness::{Awareness, AwarenessState};
pub use codec::{DeleteRange, ItemId, StateVector, Update};
pub use doc::TextDoc;
pub use error::UpdateError;

// vim: ts=4
