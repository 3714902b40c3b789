//! SQLite report store.
//!
//! One table, `prompt_reports`, with the searchable columns broken out and
//! the full report kept as JSON. Two triggers abort any `UPDATE` or `DELETE`,
//! so the table is append-only even for clients that bypass this crate.

use async_trait::async_trait;
use promptward_core::{PromptReport, ReportStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteReportStore {
    pool: SqlitePool,
}

impl SqliteReportStore {
    /// Open a store from a SQLite URL such as `sqlite://reports.db`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Persistence(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // A single connection keeps `:memory:` databases shared across calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Persistence(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite report store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prompt_reports (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                prompt_id   TEXT UNIQUE NOT NULL,
                purpose     TEXT NOT NULL,
                session_id  TEXT NOT NULL,
                user_id     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                report      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("prompt_reports table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS prompt_reports_no_update
            BEFORE UPDATE ON prompt_reports BEGIN
                SELECT RAISE(ABORT, 'prompt_reports is append-only');
            END
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("update trigger: {e}")))?;

        sqlx::query(
            r#"
            CREATE TRIGGER IF NOT EXISTS prompt_reports_no_delete
            BEFORE DELETE ON prompt_reports BEGIN
                SELECT RAISE(ABORT, 'prompt_reports is append-only');
            END
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("delete trigger: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_prompt_reports_session ON prompt_reports(session_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(format!("session index: {e}")))?;

        debug!("SQLite report migrations complete");
        Ok(())
    }

    fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<PromptReport, StoreError> {
        let json: String = row
            .try_get("report")
            .map_err(|e| StoreError::Query(format!("report column: {e}")))?;
        serde_json::from_str(&json).map_err(|e| StoreError::Query(format!("Corrupt report row: {e}")))
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save(&self, report: &PromptReport) -> Result<(), StoreError> {
        let json = serde_json::to_string(report)
            .map_err(|e| StoreError::Persistence(format!("Report serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO prompt_reports (prompt_id, purpose, session_id, user_id, created_at, report)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&report.prompt_id)
        .bind(report.purpose.as_str())
        .bind(&report.session_id)
        .bind(&report.user_id)
        .bind(report.created_at.to_rfc3339())
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Persistence(format!("INSERT failed: {e}")))?;

        debug!(prompt_id = %report.prompt_id, "Report stored");
        Ok(())
    }

    async fn find_by_prompt_id(&self, prompt_id: &str) -> Result<Option<PromptReport>, StoreError> {
        let row = sqlx::query("SELECT report FROM prompt_reports WHERE prompt_id = ?1")
            .bind(prompt_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("GET by prompt id: {e}")))?;
        row.as_ref().map(Self::row_to_report).transpose()
    }

    async fn scan_recent(&self, limit: usize) -> Result<Vec<PromptReport>, StoreError> {
        let rows = sqlx::query("SELECT report FROM prompt_reports ORDER BY iid DESC LIMIT ?1")
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("Recent scan: {e}")))?;
        rows.iter().map(Self::row_to_report).collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM prompt_reports")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("COUNT: {e}")))?;
        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::Query(format!("count column: {e}")))?;
        Ok(usize::try_from(cnt).unwrap_or_default())
    }
}
