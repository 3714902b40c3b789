//! Prompt reports and the append-only store they are persisted to.
//!
//! A report is the audit record paired 1:1 with an assembled prompt. It is
//! write-once: stores may insert and read reports, never update or delete
//! them. This is the only state external analytics/compliance tooling should
//! read.

use crate::error::StoreError;
use crate::purpose::Purpose;
use crate::section::{SectionId, SectionOutput};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record for one `build` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptReport {
    /// Matches the artifact's prompt id
    pub prompt_id: String,

    pub purpose: Purpose,

    pub session_id: String,

    pub user_id: String,

    /// Every generated section, included or not, in final order
    pub sections: Vec<SectionOutput>,

    /// Sections the policy bans; these were never attempted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub banned_sections: Vec<SectionId>,

    pub stable_hash: String,

    pub volatile_hash: String,

    /// Estimated tokens across the artifact's messages
    pub tokens_used: usize,

    pub token_budget: usize,

    /// Required sections alone exceeded the budget
    #[serde(default)]
    pub over_budget: bool,

    /// Version of the policy table the prompt was built under
    #[serde(default)]
    pub policy_version: u64,

    pub created_at: DateTime<Utc>,
}

impl PromptReport {
    /// Sections that made it into the artifact.
    pub fn included_sections(&self) -> impl Iterator<Item = &SectionOutput> {
        self.sections.iter().filter(|s| s.is_included())
    }

    /// Sections that were generated but left out, with their reasons.
    pub fn excluded_sections(&self) -> impl Iterator<Item = &SectionOutput> {
        self.sections.iter().filter(|s| !s.is_included())
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionOutput> {
        self.sections.iter().find(|s| s.id() == id)
    }
}

/// Append-only persistence for prompt reports.
///
/// Implementations: in-memory (for testing), JSONL file, SQLite.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "jsonl", "memory").
    fn name(&self) -> &str;

    /// Insert a report. Fails on storage error or on a duplicate prompt id.
    async fn save(&self, report: &PromptReport) -> std::result::Result<(), StoreError>;

    /// Look up a report by prompt id.
    async fn find_by_prompt_id(
        &self,
        prompt_id: &str,
    ) -> std::result::Result<Option<PromptReport>, StoreError>;

    /// Most recent reports first, at most `limit` of them.
    async fn scan_recent(&self, limit: usize) -> std::result::Result<Vec<PromptReport>, StoreError>;

    /// Total number of persisted reports.
    async fn count(&self) -> std::result::Result<usize, StoreError>;
}
