//! `promptward reports`: Read persisted prompt reports.

use super::{CliResult, runtime};
use std::path::Path;

pub async fn recent(config: Option<&Path>, limit: usize) -> CliResult {
    let runtime = runtime(config).await?;
    let store = runtime.orchestrator().store();
    let reports = store.scan_recent(limit).await?;

    if reports.is_empty() {
        println!("No reports in the {} store.", store.name());
        return Ok(());
    }
    for report in &reports {
        let included = report.included_sections().count();
        println!(
            "{}  {}  {:<22} {:>2}/{:<2} sections  {:>6} tokens{}",
            report.created_at.format("%Y-%m-%d %H:%M:%S"),
            report.prompt_id,
            report.purpose.as_str(),
            included,
            report.sections.len(),
            report.tokens_used,
            if report.over_budget { "  over budget" } else { "" }
        );
    }
    Ok(())
}

pub async fn show(config: Option<&Path>, prompt_id: &str) -> CliResult {
    let runtime = runtime(config).await?;
    let report = runtime
        .orchestrator()
        .store()
        .find_by_prompt_id(prompt_id)
        .await?
        .ok_or_else(|| format!("No report for prompt '{prompt_id}'"))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
