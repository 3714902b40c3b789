//! Subcommand implementations and the helpers they share.

pub mod build;
pub mod compliance;
pub mod doctor;
pub mod init;
pub mod invoke;
pub mod policies;
pub mod reports;
pub mod serve;

use promptward_config::AppConfig;
use promptward_core::Context;
use promptward_server::Runtime;
use std::path::{Path, PathBuf};
use tracing::debug;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The config file in use: `--config` or the default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load config with environment overrides applied.
pub fn load_config(explicit: Option<&Path>) -> CliResult<AppConfig> {
    let path = config_path(explicit);
    debug!(path = %path.display(), "Loading config");
    AppConfig::load_at(&path).map_err(|e| format!("Failed to load config: {e}").into())
}

pub async fn runtime(explicit: Option<&Path>) -> CliResult<Runtime> {
    let config = load_config(explicit)?;
    Ok(Runtime::from_config(config).await?)
}

/// Read a request context from a JSON file.
pub fn read_context(path: &Path) -> CliResult<Context> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read context file {}: {e}", path.display()))?;
    let ctx = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid context file {}: {e}", path.display()))?;
    Ok(ctx)
}
