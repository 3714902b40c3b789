//! `promptward doctor`: Validate config and run the startup self-check.

use super::{CliResult, config_path, load_config};
use promptward_core::Purpose;
use promptward_engine::{Orchestrator, default_registry};
use promptward_security::SealKey;
use std::path::Path;

pub fn run(explicit: Option<&Path>) -> CliResult {
    println!("🩺 promptward doctor");
    println!("====================\n");

    let mut issues = 0;
    let mut warnings = 0;

    let path = config_path(explicit);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults (run `promptward init`)", path.display());
        warnings += 1;
    }

    let config = match load_config(explicit) {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ {e}");
            return Err("doctor found 1 issue".into());
        }
    };

    match config.validate() {
        Ok(()) => println!("  ✅ Config valid"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    match promptward_server::policy_table(&config) {
        Ok(table) => match Orchestrator::self_check(&default_registry(), &table) {
            Ok(()) => println!("  ✅ Policy table v{} matches the section registry", table.version()),
            Err(e) => {
                println!("  ❌ Self-check failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Policy table invalid: {e}");
            issues += 1;
        }
    }

    let sites = promptward_server::call_site_registry(&config);
    let uncovered: Vec<&str> = Purpose::ALL
        .iter()
        .filter(|p| !sites.sites().any(|s| s.permits(**p)))
        .map(|p| p.as_str())
        .collect();
    if uncovered.is_empty() {
        println!("  ✅ Every purpose has a call site ({} sites)", sites.len());
    } else {
        println!("  ⚠️  No call site permits: {}", uncovered.join(", "));
        warnings += 1;
    }

    match SealKey::from_config(config.seal.key_hex.as_deref()) {
        Ok(_) if config.seal.key_hex.is_some() => println!("  ✅ Seal key configured"),
        Ok(_) => println!("  ✅ Seal key: per-process"),
        Err(e) => {
            println!("  ❌ Seal key unusable: {e}");
            issues += 1;
        }
    }

    if config.has_api_key() || config.providers.values().any(|p| p.api_key.is_some()) {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key; `invoke` will fail until one is set");
        warnings += 1;
    }

    println!();
    if issues > 0 {
        return Err(format!("doctor found {issues} issue(s)").into());
    }
    if warnings == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  {warnings} warning(s). See above for details.");
    }
    Ok(())
}
