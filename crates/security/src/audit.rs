//! Compliance logging: the audit trail for model access.
//!
//! Every model call is recorded *before* the provider is contacted, every
//! rejected invocation is recorded as a bypass attempt, and every policy
//! table swap is recorded with its old and new versions.

use chrono::{DateTime, Utc};
use promptward_core::Purpose;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single compliance log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
    /// Who acted (call-site id, component name)
    pub actor: String,
    /// What was acted on (prompt id, policy table)
    pub target: String,
    pub outcome: AuditOutcome,
    pub details: Option<String>,
}

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A gateway invocation passed every check and is about to reach the provider
    ModelCall { site: String, purpose: Purpose },
    /// A gateway invocation was rejected
    BypassAttempt { site: String, reason: String },
    /// The policy table was replaced
    PolicySwap { from_version: u64, to_version: u64 },
    /// A provider call that had been logged came back with an error
    ProviderFailure { site: String },
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

/// Trait for compliance log sinks (where entries are written).
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// In-process compliance log that keeps entries in memory and forwards
/// them to its sinks.
pub struct ComplianceLog {
    entries: Mutex<Vec<AuditEntry>>,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl std::fmt::Debug for ComplianceLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceLog")
            .field("entry_count", &self.count())
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl Default for ComplianceLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceLog {
    /// Create a new log with no sinks.
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Create a new log with the given sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sinks,
        }
    }

    /// Entries stay readable after a panic elsewhere poisoned the lock.
    fn lock(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event.
    pub fn log(
        &self,
        event: AuditEvent,
        actor: &str,
        target: &str,
        outcome: AuditOutcome,
        details: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            event,
            actor: actor.into(),
            target: target.into(),
            outcome,
            details,
        };

        self.lock().push(entry.clone());

        for sink in &self.sinks {
            sink.record(&entry);
        }
    }

    /// Get all recorded entries.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    /// Get entries filtered by outcome.
    pub fn entries_by_outcome(&self, outcome: &AuditOutcome) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| &e.outcome == outcome)
            .cloned()
            .collect()
    }

    /// Number of recorded bypass attempts.
    pub fn bypass_attempts(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e.event, AuditEvent::BypassAttempt { .. }))
            .count()
    }

    /// Count of stored entries.
    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

/// A tracing-based sink: successes at `info`, everything else at `warn`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        if entry.outcome == AuditOutcome::Success {
            tracing::info!(
                event = ?entry.event,
                actor = %entry.actor,
                target = %entry.target,
                details = ?entry.details,
                "COMPLIANCE"
            );
        } else {
            tracing::warn!(
                event = ?entry.event,
                actor = %entry.actor,
                target = %entry.target,
                outcome = ?entry.outcome,
                details = ?entry.details,
                "COMPLIANCE"
            );
        }
    }
}

/// Appends entries as JSON lines to a file.
///
/// Write failures are logged and do not interrupt the caller; the in-memory
/// log still holds the entry.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl JsonlSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlSink {
    fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize compliance entry");
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to append compliance entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn model_call(site: &str) -> AuditEvent {
        AuditEvent::ModelCall {
            site: site.into(),
            purpose: Purpose::IntentExtraction,
        }
    }

    #[test]
    fn log_and_retrieve_entries() {
        let log = ComplianceLog::new();
        log.log(model_call("L1_SCOUT"), "L1_SCOUT", "p-1", AuditOutcome::Success, None);
        log.log(
            AuditEvent::BypassAttempt {
                site: "ROGUE".into(),
                reason: "unknown call site".into(),
            },
            "ROGUE",
            "p-2",
            AuditOutcome::Denied,
            None,
        );

        assert_eq!(log.count(), 2);
        let entries = log.entries();
        assert_eq!(entries[0].target, "p-1");
        assert_eq!(entries[1].actor, "ROGUE");
    }

    #[test]
    fn counts_only_bypass_attempts() {
        let log = ComplianceLog::new();
        log.log(model_call("L1_SCOUT"), "L1_SCOUT", "p-1", AuditOutcome::Success, None);
        log.log(
            AuditEvent::PolicySwap {
                from_version: 1,
                to_version: 2,
            },
            "orchestrator",
            "policy-table",
            AuditOutcome::Success,
            Some("tightened budgets".into()),
        );
        for _ in 0..3 {
            log.log(
                AuditEvent::BypassAttempt {
                    site: "X".into(),
                    reason: "r".into(),
                },
                "X",
                "p",
                AuditOutcome::Denied,
                None,
            );
        }
        assert_eq!(log.bypass_attempts(), 3);
        assert_eq!(log.entries_by_outcome(&AuditOutcome::Success).len(), 2);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_value(model_call("PLANNER")).unwrap();
        assert_eq!(json["type"], "model_call");
        assert_eq!(json["purpose"], "intent-extraction");
    }

    #[test]
    fn custom_sink_receives_events() {
        struct TestSink {
            received: Arc<Mutex<Vec<String>>>,
        }

        impl AuditSink for TestSink {
            fn record(&self, entry: &AuditEntry) {
                self.received.lock().unwrap().push(entry.actor.clone());
            }
        }

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = TestSink {
            received: received.clone(),
        };
        let log = ComplianceLog::with_sinks(vec![Box::new(sink)]);

        log.log(model_call("EXECUTOR"), "EXECUTOR", "p-9", AuditOutcome::Success, None);

        let sink_entries = received.lock().unwrap();
        assert_eq!(sink_entries.as_slice(), ["EXECUTOR"]);
    }

    #[test]
    fn jsonl_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("compliance.jsonl");
        let log = ComplianceLog::with_sinks(vec![Box::new(JsonlSink::open(&path).unwrap())]);

        log.log(model_call("L1_SCOUT"), "L1_SCOUT", "p-1", AuditOutcome::Success, None);
        log.log(model_call("L1_SCOUT"), "L1_SCOUT", "p-2", AuditOutcome::Success, None);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: AuditEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.target, "p-2");
    }

    #[test]
    fn debug_format() {
        let log = ComplianceLog::new();
        let debug_str = format!("{log:?}");
        assert!(debug_str.contains("ComplianceLog"));
        assert!(debug_str.contains("entry_count"));
    }
}
