//! Compliance report: what an auditor asks the gateway for.

use crate::call_site::{CallSite, CallSiteRegistry};
use promptward_security::ScanOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    /// Number of registered call sites
    pub call_sites: usize,
    pub bypass_attempts: u64,
    pub model_calls: u64,
    pub rogue_scan: ScanOutcome,
    pub sites: Vec<CallSite>,
}

impl ComplianceReport {
    pub fn new(sites: &CallSiteRegistry, bypass_attempts: u64, model_calls: u64, rogue_scan: ScanOutcome) -> Self {
        Self {
            call_sites: sites.len(),
            bypass_attempts,
            model_calls,
            rogue_scan,
            sites: sites.sites().cloned().collect(),
        }
    }

    /// No bypass attempts and a clean scan. A scan that was not run does not count as clean.
    pub fn is_compliant(&self) -> bool {
        self.bypass_attempts == 0 && self.rogue_scan.is_clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptward_security::Violation;

    #[test]
    fn serializes_scan_status() {
        let report = ComplianceReport::new(
            &CallSiteRegistry::builtin(),
            2,
            10,
            ScanOutcome::Dirty {
                files_scanned: 3,
                violations: vec![Violation {
                    path: "crates/cli/src/main.rs".into(),
                    line: 12,
                    pattern: "provider-complete".into(),
                    snippet: "provider.complete(req)".into(),
                }],
            },
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["call_sites"], CallSiteRegistry::builtin().len());
        assert_eq!(json["bypass_attempts"], 2);
        assert_eq!(json["rogue_scan"]["status"], "dirty");
        assert_eq!(json["rogue_scan"]["violations"][0]["line"], 12);
        assert!(!report.is_compliant());
    }

    #[test]
    fn clean_scan_without_bypasses_is_compliant() {
        let clean = ComplianceReport::new(
            &CallSiteRegistry::builtin(),
            0,
            4,
            ScanOutcome::Clean { files_scanned: 40 },
        );
        assert!(clean.is_compliant());

        let not_run = ComplianceReport::new(&CallSiteRegistry::builtin(), 0, 4, ScanOutcome::NotRun);
        assert!(!not_run.is_compliant());
    }
}
