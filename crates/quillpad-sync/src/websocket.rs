//! WebSocket session handler for document rooms
//!
//! Each connection runs two tasks: one pumping room broadcasts out to the
//! socket, one pumping socket frames into the room mailbox. When either side
//! ends, the session leaves its room and both tasks stop; the room's
//! in-flight flush is unaffected.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::sink::SinkExt;
use futures::stream::StreamExt;

use crate::prelude::*;
use crate::room::{Outbound, RoomMsg, RoomRegistry, SessionHandle};

/// Drive one upgraded WebSocket against the room for `doc_name`.
pub async fn handle_doc_connection(socket: WebSocket, doc_name: String, registry: Arc<RoomRegistry>) {
	let session_id = registry.next_session_id();
	info!("Doc connection: session {} -> {}", session_id, doc_name);

	let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel::<Outbound>();
	let room_tx = registry.join(&doc_name, SessionHandle { id: session_id, tx: outbound_tx }).await;

	let (mut ws_tx, mut ws_rx) = socket.split();

	// Room -> socket
	let mut send_task = tokio::spawn(async move {
		while let Some(out) = outbound_rx.recv().await {
			match out {
				Outbound::Frame(bytes) => {
					if ws_tx.send(Message::Binary(bytes.into())).await.is_err() {
						break;
					}
				}
				Outbound::Disconnect => {
					let _ = ws_tx.send(Message::Close(None)).await;
					break;
				}
			}
		}
	});

	// Socket -> room
	let room_tx_in = room_tx.clone();
	let mut recv_task = tokio::spawn(async move {
		while let Some(msg) = ws_rx.next().await {
			match msg {
				Ok(Message::Binary(data)) => {
					let frame = RoomMsg::Frame { session: session_id, data: data.to_vec() };
					if room_tx_in.send(frame).is_err() {
						break;
					}
				}
				Ok(Message::Close(_)) => break,
				// The doc protocol is binary-only; control frames are
				// handled by axum, anything else is ignored.
				Ok(_) => {}
				Err(err) => {
					debug!("Session {} socket error: {}", session_id, err);
					break;
				}
			}
		}
	});

	tokio::select! {
		_ = &mut send_task => {}
		_ = &mut recv_task => {}
	}

	let _ = room_tx.send(RoomMsg::Leave(session_id));
	send_task.abort();
	recv_task.abort();
	info!("Doc connection closed: session {} -> {}", session_id, doc_name);
}

// vim: ts=4
