//! `promptward compliance`: Run the rogue-prompt scan and print the report.
//!
//! Exits non-zero when the scan finds a direct provider call outside the
//! allow-listed paths, so CI can gate on it.

use super::{CliResult, load_config};
use promptward_gateway::ComplianceReport;
use promptward_security::ScanOutcome;
use std::path::{Path, PathBuf};

pub fn run(config: Option<&Path>, root: Option<PathBuf>, json: bool) -> CliResult {
    let config = load_config(config)?;
    let root = root
        .or_else(|| config.compliance.scan_root.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let scan = promptward_server::rogue_scan_at(&root, &config.compliance.allowed_paths);
    // A fresh process has made no calls; counters start at zero.
    let report = ComplianceReport::new(&promptward_server::call_site_registry(&config), 0, 0, scan);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&root, &report));
    }

    match &report.rogue_scan {
        ScanOutcome::Clean { .. } => Ok(()),
        ScanOutcome::Dirty { violations, .. } => {
            Err(format!("rogue-prompt scan found {} violation(s)", violations.len()).into())
        }
        ScanOutcome::NotRun => Err(format!("rogue-prompt scan could not read {}", root.display()).into()),
    }
}

pub fn render(root: &Path, report: &ComplianceReport) -> String {
    let mut out = String::from("🛡️  promptward compliance\n");
    out.push_str(&format!("  Call sites: {}\n", report.call_sites));
    for site in &report.sites {
        let purposes: Vec<&str> = site.purposes.iter().map(|p| p.as_str()).collect();
        out.push_str(&format!("    {:<16} {}  ({})\n", site.id, purposes.join(", "), site.owner));
    }
    match &report.rogue_scan {
        ScanOutcome::Clean { files_scanned } => {
            out.push_str(&format!("  ✅ Scan of {}: clean ({files_scanned} files)\n", root.display()));
        }
        ScanOutcome::Dirty {
            files_scanned,
            violations,
        } => {
            out.push_str(&format!(
                "  ❌ Scan of {}: {} violation(s) in {files_scanned} files\n",
                root.display(),
                violations.len()
            ));
            for v in violations {
                out.push_str(&format!("     {}:{} [{}] {}\n", v.path, v.line, v.pattern, v.snippet));
            }
        }
        ScanOutcome::NotRun => out.push_str("  ⚠️  Scan not run\n"),
    }
    out
}
