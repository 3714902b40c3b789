//! `promptward invoke`: Assemble a prompt and send it through a call site.

use super::{CliResult, read_context, runtime};
use std::path::Path;

pub async fn run(config: Option<&Path>, context: &Path, site: &str, model: Option<&str>) -> CliResult {
    let ctx = read_context(context)?;
    let runtime = runtime(config).await?;
    let (artifact, report) = runtime.orchestrator().build(&ctx).await?;
    let settings = runtime.invoke_settings(model);

    let response = runtime.gateway().invoke(&artifact, site, &settings).await?;

    println!("{}", response.message.content);
    eprintln!();
    eprintln!("  Prompt:  {} ({} tokens)", report.prompt_id, report.tokens_used);
    eprintln!("  Site:    {site}");
    eprintln!("  Model:   {}", response.model);
    if let Some(usage) = response.usage {
        eprintln!(
            "  Usage:   {} prompt + {} completion = {} tokens",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }
    Ok(())
}
