//! `promptward init`: Write a default config file.

use super::{CliResult, config_path};
use promptward_config::AppConfig;
use std::path::Path;

pub fn run(explicit: Option<&Path>, force: bool) -> CliResult {
    let path = config_path(explicit);
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("✅ Wrote {}", path.display());
    println!("   Set api_key (or PROMPTWARD_API_KEY) before using `promptward invoke`.");
    Ok(())
}
