//! In-memory report store: useful for testing and ephemeral runs.

use async_trait::async_trait;
use promptward_core::{PromptReport, ReportStore, StoreError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Reports in insertion order.
pub struct InMemoryReportStore {
    reports: Arc<RwLock<Vec<PromptReport>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, report: &PromptReport) -> Result<(), StoreError> {
        let mut reports = self.reports.write().await;
        if reports.iter().any(|r| r.prompt_id == report.prompt_id) {
            return Err(StoreError::Persistence(format!(
                "Report '{}' already exists",
                report.prompt_id
            )));
        }
        reports.push(report.clone());
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
