//! Session layer for Quillpad collaborative documents.
//!
//! One room per open document, one task per room, one task pair per live
//! WebSocket connection. Sessions talk to their room exclusively through its
//! mailbox, so the document itself is only ever touched from the room task.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod persist;
pub mod protocol;
pub mod room;
pub mod websocket;

mod prelude;

pub use admission::{validate, RejectionReason};
pub use persist::PersistenceBridge;
pub use room::{RoomOptions, RoomRegistry};
pub use websocket::handle_doc_connection;

// vim: ts=4
