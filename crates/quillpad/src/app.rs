//! App builder - constructs and runs the Quillpad application

use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use crate::routes;
use crate::store_adapter::StoreAdapter;
use quillpad_sync::persist::{PersistOptions, PersistenceBridge};
use quillpad_sync::room::{RoomOptions, RoomRegistry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Coalescing interval for dirty-room flushes.
	pub flush_interval: Duration,
}

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub registry: Arc<RoomRegistry>,
	pub store: Arc<dyn StoreAdapter>,
}

pub type App = Arc<AppState>;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	store: Option<Arc<dyn StoreAdapter>>,
	persist_opts: PersistOptions,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:8080".into(),
				flush_interval: Duration::from_secs(2),
			},
			store: None,
			persist_opts: PersistOptions::default(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn flush_interval(&mut self, interval: Duration) -> &mut Self {
		self.opts.flush_interval = interval;
		self
	}
	pub fn persist_options(&mut self, opts: PersistOptions) -> &mut Self {
		self.persist_opts = opts;
		self
	}

	// Adapters
	pub fn store_adapter(&mut self, store: Arc<dyn StoreAdapter>) -> &mut Self {
		self.store = Some(store);
		self
	}

	/// Assemble the application state without starting the server.
	pub fn build(self) -> QpResult<App> {
		let Some(store) = self.store else {
			error!("FATAL: No store adapter configured");
			return Err(Error::Internal("No store adapter configured".to_string()));
		};
		let bridge = PersistenceBridge::with_options(store.clone(), self.persist_opts);
		let registry =
			RoomRegistry::new(bridge, RoomOptions { flush_interval: self.opts.flush_interval });
		Ok(Arc::new(AppState { opts: self.opts, registry, store }))
	}

	pub async fn run(self) -> QpResult<()> {
		// Init logging
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.init();

		let app = self.build()?;
		info!("Quillpad v{}", VERSION);

		let router = routes::init(app.clone());
		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on {}", app.opts.listen);
		axum::serve(listener, router)
			.await
			.map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
