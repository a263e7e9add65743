use std::{env, path, sync::Arc};

use quillpad_store_adapter_redb::StoreAdapterRedb;

pub struct Config {
	pub db_dir: path::PathBuf,
	pub listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = Config {
		db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or("./data".to_string())),
		listen: env::var("LISTEN").unwrap_or("127.0.0.1:8080".to_string()),
	};

	let store = Arc::new(StoreAdapterRedb::new(config.db_dir.join("snapshots.db")).await?);

	let mut builder = quillpad::AppBuilder::new();
	builder.listen(config.listen).store_adapter(store);
	builder.run().await?;

	Ok(())
}

// vim: ts=4
