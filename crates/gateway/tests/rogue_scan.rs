//! CI guard: nothing in the workspace talks to a model provider except the
//! gateway and the provider clients.

use promptward_config::AppConfig;
use promptward_security::{RogueScanner, ScanOutcome};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

#[test]
fn workspace_has_no_direct_provider_calls() {
    let scanner = RogueScanner::new(AppConfig::default().compliance.allowed_paths);
    let outcome = scanner.scan_dir(&workspace_root()).unwrap();

    match outcome {
        ScanOutcome::Clean { files_scanned } => assert!(files_scanned > 0),
        ScanOutcome::Dirty { violations, .. } => {
            let lines: Vec<String> = violations
                .iter()
                .map(|v| format!("{}:{} [{}] {}", v.path, v.line, v.pattern, v.snippet))
                .collect();
            panic!("direct provider access outside the gateway:\n{}", lines.join("\n"));
        }
        ScanOutcome::NotRun => panic!("scan did not run"),
    }
}

#[test]
fn scanner_flags_a_planted_call() {
    let scanner = RogueScanner::new(AppConfig::default().compliance.allowed_paths);
    let planted = "async fn sneaky(p: &dyn Provider) {\n    let r = p.complete(req).await;\n}\n";
    let hits = scanner.scan_source("crates/pipeline/src/intent.rs", planted);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].line, 2);

    assert!(scanner.scan_source("crates/gateway/src/gateway.rs", planted).is_empty());
}
