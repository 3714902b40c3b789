//! `promptward build`: Assemble a prompt and show what went into it.

use super::{CliResult, read_context, runtime};
use promptward_core::PromptReport;
use std::path::Path;

pub async fn run(config: Option<&Path>, context: &Path, json: bool) -> CliResult {
    let ctx = read_context(context)?;
    let runtime = runtime(config).await?;
    let (artifact, report) = runtime.orchestrator().build(&ctx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for message in artifact.messages() {
        println!("── {} ──", message.role.as_str());
        println!("{}\n", message.content);
    }
    print!("{}", summarize(&report));
    Ok(())
}

/// Human-readable report summary: one line per section, then totals.
pub fn summarize(report: &PromptReport) -> String {
    let mut out = format!(
        "Prompt {} ({}, policy v{})\n",
        report.prompt_id, report.purpose, report.policy_version
    );
    for section in &report.sections {
        let line = if section.is_included() {
            format!("  ✅ {:<20} {:>6} tokens\n", section.id().as_str(), section.tokens())
        } else {
            format!(
                "  ⏭️  {:<20} {}\n",
                section.id().as_str(),
                section.gating_reason().unwrap_or_default()
            )
        };
        out.push_str(&line);
    }
    for banned in &report.banned_sections {
        out.push_str(&format!("  🚫 {:<20} banned\n", banned.as_str()));
    }
    out.push_str(&format!(
        "  Tokens: {}/{}{}\n",
        report.tokens_used,
        report.token_budget,
        if report.over_budget { " (over budget)" } else { "" }
    ));
    out.push_str(&format!("  Stable hash:   {}\n", report.stable_hash));
    out.push_str(&format!("  Volatile hash: {}\n", report.volatile_hash));
    out
}
