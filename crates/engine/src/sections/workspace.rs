//! Workspace bootstrap files and runtime capabilities.
//!
//! The caller reads the files; these generators only render what is already
//! in the context.

use promptward_core::{CacheClass, Context, SectionId, SectionOutput};

/// Per-file character cap for bootstrap files.
pub const MAX_FILE_CHARS: usize = 4_000;

pub fn workspace_bootstrap(ctx: &Context) -> SectionOutput {
    let mut files: Vec<_> = ctx
        .workspace_files
        .iter()
        .filter(|f| !f.content.trim().is_empty())
        .collect();
    if files.is_empty() {
        return SectionOutput::gated(
            SectionId::WorkspaceBootstrap,
            CacheClass::Semistable,
            "no workspace bootstrap files provided",
        );
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let blocks: Vec<String> = files
        .into_iter()
        .map(|f| format!("[File: {}]\n{}", f.path, truncate(f.content.trim(), MAX_FILE_CHARS)))
        .collect();
    SectionOutput::included(
        SectionId::WorkspaceBootstrap,
        blocks.join("\n\n"),
        CacheClass::Semistable,
    )
}

pub fn runtime_capabilities(ctx: &Context) -> SectionOutput {
    let Some(runtime) = &ctx.runtime else {
        return SectionOutput::gated(
            SectionId::RuntimeCapabilities,
            CacheClass::Semistable,
            "no runtime information provided",
        );
    };

    let mut content = String::from("[Runtime]\n");
    if !runtime.platform.is_empty() {
        content.push_str(&format!("Platform: {}\n", runtime.platform));
    }
    if !runtime.model.is_empty() {
        content.push_str(&format!("Model: {}\n", runtime.model));
    }
    let mut caps: Vec<&str> = runtime.capabilities.iter().map(String::as_str).collect();
    caps.sort_unstable();
    caps.dedup();
    if !caps.is_empty() {
        content.push_str(&format!("Capabilities: {}\n", caps.join(", ")));
    }

    if content == "[Runtime]\n" {
        return SectionOutput::gated(
            SectionId::RuntimeCapabilities,
            CacheClass::Semistable,
            "runtime information is empty",
        );
    }
    SectionOutput::included(
        SectionId::RuntimeCapabilities,
        content.trim_end(),
        CacheClass::Semistable,
    )
}

/// Cut `text` to at most `max` chars on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n...[truncated]", &text[..idx]),
        None => text.to_string(),
    }
}
