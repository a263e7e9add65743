//! Document creation and metadata handlers
//!
//! The upload path is the only place untrusted raw text enters the system,
//! so the admission guard runs here, once, before the document exists.
//! Accepted text is seeded into a fresh replica with one bulk insert and the
//! snapshot stored under a newly generated id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::prelude::*;
use crate::utils::{is_valid_doc_name, random_id};
use quillpad_crdt::TextDoc;
use quillpad_sync::admission;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
	pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
	pub id: String,
}

/// `POST /api/upload` - create a document from raw text.
pub async fn post_upload(
	State(app): State<crate::app::App>,
	Json(req): Json<UploadRequest>,
) -> Response {
	if let Err(reason) = admission::validate(&req.content) {
		info!("Upload rejected: {}", reason);
		return (StatusCode::BAD_REQUEST, Json(reason)).into_response();
	}

	match create_document(&app, &req.content).await {
		Ok(id) => {
			info!("Document created: {} ({} bytes)", id, req.content.len());
			Json(UploadResponse { id }).into_response()
		}
		Err(err) => err.into_response(),
	}
}

/// `GET /new` - create an empty pad and redirect to it.
pub async fn get_new(State(app): State<crate::app::App>) -> Response {
	match create_document(&app, "").await {
		Ok(id) => Redirect::to(&format!("/{}", id)).into_response(),
		Err(err) => err.into_response(),
	}
}

/// `GET /api/doc/{doc_id}` - existence check, so the page layer can tell a
/// fresh pad from a missing one.
pub async fn get_doc_meta(
	State(app): State<crate::app::App>,
	Path(doc_id): Path<String>,
) -> Response {
	if !is_valid_doc_name(&doc_id) {
		return Error::NotFound.into_response();
	}
	match app.store.exists(&doc_id).await {
		Ok(exists) => Json(json!({ "id": doc_id, "exists": exists })).into_response(),
		Err(err) => err.into_response(),
	}
}

/// Seed a replica with `content`, snapshot it, and store the snapshot under
/// a fresh id. The replica is discarded; the first room to open the document
/// hydrates from the snapshot.
async fn create_document(app: &crate::app::App, content: &str) -> QpResult<String> {
	let id = random_id()?;
	let client: u64 = rand::rng().random();
	let doc = TextDoc::with_text(client, content);
	app.store.put(&id, &doc.snapshot()).await?;
	Ok(id)
}

// vim: ts=4
