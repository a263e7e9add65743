//! WebSocket upgrade handler for collaborative documents
//!
//! Route: `/ws/doc/{doc_id}`. Only this path is claimed; the upgrade is
//! never consumed for traffic the document layer doesn't own.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;

use crate::prelude::*;
use crate::utils::is_valid_doc_name;
use quillpad_sync::websocket::handle_doc_connection;

/// Close the socket right after upgrade with an application close code.
async fn close_with_error(mut socket: WebSocket, code: u16, reason: &'static str) {
	let _ = socket.send(Message::Close(Some(CloseFrame { code, reason: reason.into() }))).await;
}

/// WebSocket upgrade handler for document sessions.
///
/// Unknown-but-well-formed ids are admitted: the room hydrates to an empty
/// document and the first flush creates the record. Malformed ids are
/// rejected with a close frame.
pub async fn get_ws_doc(
	ws: WebSocketUpgrade,
	Path(doc_id): Path<String>,
	State(app): State<crate::app::App>,
) -> Response {
	debug!("WebSocket doc request: {}", doc_id);

	if !is_valid_doc_name(&doc_id) {
		warn!("Doc WebSocket rejected - malformed id: {}", doc_id);
		return ws.on_upgrade(|socket| close_with_error(socket, 4404, "Unknown document"));
	}

	let registry = app.registry.clone();
	ws.on_upgrade(move |socket| handle_doc_connection(socket, doc_id, registry))
}

// vim: ts=4
