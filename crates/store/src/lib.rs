//! Report store implementations for promptward.
//!
//! Every backend is append-only: reports are inserted and read, never
//! updated or deleted. A duplicate prompt id is a persistence failure.

pub mod in_memory;
pub mod jsonl;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryReportStore;
pub use jsonl::JsonlReportStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteReportStore;

use promptward_core::{ReportStore, StoreError};
use std::path::Path;
use std::sync::Arc;

/// Backend names accepted by [`open`].
pub const BACKENDS: &[&str] = &["sqlite", "jsonl", "memory"];

/// Open the named backend at `path` (ignored for `memory`).
pub async fn open(backend: &str, path: &Path) -> Result<Arc<dyn ReportStore>, StoreError> {
    match backend {
        "memory" => Ok(Arc::new(InMemoryReportStore::new())),
        "jsonl" => Ok(Arc::new(JsonlReportStore::open(path)?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Persistence(format!("Failed to create store directory: {e}")))?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteReportStore::new(&url).await?))
        }
        other => Err(StoreError::Persistence(format!(
            "Unknown report store backend '{other}' (expected one of: {})",
            BACKENDS.join(", ")
        ))),
    }
}
