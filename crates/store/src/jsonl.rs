//! JSON-lines report store: one report per line, append-only.
//!
//! Reports are loaded into memory when the file is opened and every new
//! report is appended to the end of the file. Existing lines are never
//! rewritten. Lines that fail to parse are skipped with a warning so that a
//! single torn write cannot hide the rest of the trail.

use async_trait::async_trait;
use promptward_core::{PromptReport, ReportStore, StoreError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct JsonlReportStore {
    path: PathBuf,
    reports: RwLock<Vec<PromptReport>>,
}

impl JsonlReportStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let reports = Self::load_from_disk(&path)?;
        debug!(path = %path.display(), count = reports.len(), "JSONL report store loaded");
        Ok(Self {
            path,
            reports: RwLock::new(reports),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Result<Vec<PromptReport>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Query(format!("Failed to read report file: {e}"))),
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(idx, line)| match serde_json::from_str::<PromptReport>(line) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "Skipping corrupted report line");
                    None
                }
            })
            .collect())
    }

    /// Blocking append of one line, flushed to disk before returning.
    fn append(path: &Path, line: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Persistence(format!("Failed to create report directory: {e}")))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StoreError::Persistence(format!("Failed to open report file: {e}")))?;
        writeln!(file, "{line}")
            .and_then(|()| file.sync_data())
            .map_err(|e| StoreError::Persistence(format!("Failed to append report: {e}")))
    }
}

#[async_trait]
impl ReportStore for JsonlReportStore {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn save(&self, report: &PromptReport) -> Result<(), StoreError> {
        let line = serde_json::to_string(report)
            .map_err(|e| StoreError::Persistence(format!("Failed to serialize report: {e}")))?;

        // Held across the append so two saves cannot interleave or race the
        // duplicate check.
        let mut reports = self.reports.write().await;
        if reports.iter().any(|r| r.prompt_id == report.prompt_id) {
            return Err(StoreError::Persistence(format!(
                "Report '{}' already exists",
                report.prompt_id
            )));
        }
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::append(&path, &line))
            .await
            .map_err(|e| StoreError::Persistence(format!("Report append task failed: {e}")))??;
        reports.push(report.clone());
        debug!(prompt_id = %report.prompt_id, "Report appended");
        Ok(())
    }

    async fn find_by_prompt_id(&self, prompt_id: &str) -> Result<Option<PromptReport>, StoreError> {
        let reports = self.reports.read().await;
        Ok(reports.iter().find(|r| r.prompt_id == prompt_id).cloned())
    }

    async fn scan_recent(&self, limit: usize) -> Result<Vec<PromptReport>, StoreError> {
        let reports = self.reports.read().await;
        Ok(reports.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.reports.read().await.len())
    }
}
