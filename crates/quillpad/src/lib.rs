//! Quillpad is a self-hosted collaborative markdown pad server.
//!
//! A pad is a plain markdown document identified by an opaque URL-safe id.
//! Documents are created through the upload path (admission-checked), then
//! edited collaboratively over `/ws/doc/{doc_id}` with CRDT updates and
//! presence relayed between peers and snapshots flushed to the injected
//! store adapter.

// Re-export shared types and the adapter trait from quillpad-types
pub use quillpad_types::error;
pub use quillpad_types::store_adapter;
pub use quillpad_types::utils;

// Feature crate re-exports
pub use quillpad_crdt as crdt;
pub use quillpad_sync as sync;

// Local modules
pub mod app;
pub mod handler;
pub mod prelude;
pub mod routes;
pub mod websocket;

pub use crate::app::{App, AppBuilder, AppBuilderOpts, AppState};

// vim: ts=4
