//! Shared error taxonomy.
//!
//! Protocol-level errors (malformed updates, causal gaps) live in
//! `quillpad-crdt` and stay session-scoped; admission rejections live in
//! `quillpad-sync::admission` and stay request-scoped. This type covers
//! everything that crosses a component boundary: storage failures, lookup
//! failures, and the HTTP mapping for the app surface.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub type QpResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	Validation(String),
	Db(String),
	/// Durable storage was unreachable or timed out after retries.
	Storage(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::Validation(msg) => write!(f, "validation error: {}", msg),
			Error::Db(msg) => write!(f, "database error: {}", msg),
			Error::Storage(msg) => write!(f, "storage unavailable: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "i/o error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, msg) = match &self {
			Error::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
			Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
			Error::Storage(_) => {
				(StatusCode::SERVICE_UNAVAILABLE, "storage unavailable".to_string())
			}
			_ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
		};
		(status, Json(json!({ "error": msg }))).into_response()
	}
}

// vim: ts=4
