//! Route table
//!
//! The router claims only the paths it owns. Everything else (static pages,
//! dev-reload channels, unrelated upgrade requests) falls through to the
//! fallback untouched, so other layers can serve it.

use axum::routing::{get, post};
use axum::Router;

use crate::app::App;
use crate::{handler, websocket};

pub fn init(app: App) -> Router {
	Router::new()
		.route("/api/upload", post(handler::post_upload))
		.route("/api/doc/{doc_id}", get(handler::get_doc_meta))
		.route("/new", get(handler::get_new))
		.route("/ws/doc/{doc_id}", get(websocket::get_ws_doc))
		.with_state(app)
}

// vim: ts=4
