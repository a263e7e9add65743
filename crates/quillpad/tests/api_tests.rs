//! Router-level tests for the upload/creation path.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use quillpad::app::{AppBuilderOpts, AppState};
use quillpad::crdt::TextDoc;
use quillpad::error::QpResult;
use quillpad::store_adapter::StoreAdapter;
use quillpad::sync::persist::PersistenceBridge;
use quillpad::sync::room::{RoomOptions, RoomRegistry};
use quillpad::utils::ID_LENGTH;

#[derive(Debug, Default)]
struct MemStore {
	data: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl StoreAdapter for MemStore {
	async fn get(&self, doc_name: &str) -> QpResult<Option<Vec<u8>>> {
		Ok(self.data.lock().unwrap().get(doc_name).cloned())
	}

	async fn put(&self, doc_name: &str, snapshot: &[u8]) -> QpResult<()> {
		self.data.lock().unwrap().insert(doc_name.to_string(), snapshot.to_vec());
		Ok(())
	}

	async fn exists(&self, doc_name: &str) -> QpResult<bool> {
		Ok(self.data.lock().unwrap().contains_key(doc_name))
	}
}

fn test_app() -> (quillpad::App, Arc<MemStore>) {
	let store = Arc::new(MemStore::default());
	let adapter: Arc<dyn StoreAdapter> = Arc::clone(&store) as Arc<dyn StoreAdapter>;
	let registry = RoomRegistry::new(
		PersistenceBridge::new(Arc::clone(&adapter)),
		RoomOptions { flush_interval: Duration::from_millis(50) },
	);
	let app = Arc::new(AppState {
		opts: AppBuilderOpts { listen: "127.0.0.1:0".into(), flush_interval: Duration::from_millis(50) },
		registry,
		store: adapter,
	});
	(app, store)
}

fn upload_request(content: &str) -> Request<Body> {
	let body = serde_json::json!({ "content": content }).to_string();
	Request::builder()
		.method("POST")
		.uri("/api/upload")
		.header("content-type", "application/json")
		.body(Body::from(body))
		.unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_creates_document() {
	let (app, store) = test_app();
	let router = quillpad::routes::init(app);

	let response = router.oneshot(upload_request("# Hello pad")).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let body = json_body(response).await;
	let id = body["id"].as_str().unwrap().to_string();
	assert_eq!(id.len(), ID_LENGTH);

	// The stored snapshot hydrates back to the uploaded text.
	let snapshot = store.data.lock().unwrap().get(&id).cloned().unwrap();
	let doc = TextDoc::from_snapshot(1, &snapshot).unwrap();
	assert_eq!(doc.materialized_text(), "# Hello pad");
}

#[tokio::test]
async fn test_upload_rejects_deep_nesting() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let content = format!("{}x{}", "[".repeat(101), "]".repeat(101));
	let response = router.oneshot(upload_request(&content)).await.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = json_body(response).await;
	assert_eq!(body["reason"], "nesting_too_deep");
	assert_eq!(body["detail"], 101);
}

#[tokio::test]
async fn test_upload_rejects_repeated_run() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let response = router.oneshot(upload_request(&"a".repeat(10_001))).await.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = json_body(response).await;
	assert_eq!(body["reason"], "repeated_character_run");
}

#[tokio::test]
async fn test_upload_accepts_run_below_limit() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let response = router.oneshot(upload_request(&"a".repeat(9_999))).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_bad_body() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let request = Request::builder()
		.method("POST")
		.uri("/api/upload")
		.header("content-type", "application/json")
		.body(Body::from("{ not json"))
		.unwrap();
	let response = router.oneshot(request).await.unwrap();
	assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_new_redirects_to_fresh_pad() {
	let (app, store) = test_app();
	let router = quillpad::routes::init(app);

	let request = Request::builder().uri("/new").body(Body::empty()).unwrap();
	let response = router.oneshot(request).await.unwrap();
	assert!(response.status().is_redirection());

	let location = response.headers()["location"].to_str().unwrap().to_string();
	let id = location.trim_start_matches('/');
	assert_eq!(id.len(), ID_LENGTH);
	assert!(store.data.lock().unwrap().contains_key(id));
}

#[tokio::test]
async fn test_doc_meta_reports_existence() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let upload = router.clone().oneshot(upload_request("content")).await.unwrap();
	let id = json_body(upload).await["id"].as_str().unwrap().to_string();

	let request = Request::builder().uri(format!("/api/doc/{}", id)).body(Body::empty()).unwrap();
	let response = router.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["exists"], true);

	let missing = "A".repeat(ID_LENGTH);
	let request =
		Request::builder().uri(format!("/api/doc/{}", missing)).body(Body::empty()).unwrap();
	let response = router.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["exists"], false);

	let request = Request::builder().uri("/api/doc/not-a-pad-id").body(Body::empty()).unwrap();
	let response = router.oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_builder_is_reusable_within_one_process() {
	// Building an app must not touch process-global state (the tracing
	// subscriber is only installed by `run()`), so embedders and tests can
	// construct as many apps as they like.
	for _ in 0..2 {
		let store: Arc<dyn StoreAdapter> = Arc::new(MemStore::default());
		let mut builder = quillpad::AppBuilder::new();
		builder.listen("127.0.0.1:0").store_adapter(store);
		builder.build().unwrap();
	}
}

#[tokio::test]
async fn test_unrelated_paths_fall_through() {
	let (app, _) = test_app();
	let router = quillpad::routes::init(app);

	let request = Request::builder().uri("/_next/webpack-hmr").body(Body::empty()).unwrap();
	let response = router.oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// vim: ts=4
