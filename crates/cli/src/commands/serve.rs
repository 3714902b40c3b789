//! `promptward serve`: Start the HTTP API server.

use super::{CliResult, load_config};
use promptward_server::Runtime;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config: Option<&Path>, port_override: Option<u16>) -> CliResult {
    let mut config = load_config(config)?;
    if let Some(port) = port_override {
        config.server.port = port;
    }

    println!("🛡️  promptward server");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Store:     {} ({})", config.store.backend, config.store.resolved_path().display());

    let runtime = Runtime::from_config(config).await?;
    promptward_server::start(Arc::new(runtime)).await
}
