//! Task-context section: the request itself.

use promptward_core::{CacheClass, Context, SectionId, SectionOutput};

pub fn task_context(ctx: &Context) -> SectionOutput {
    let task = ctx.task_description.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let transcript = ctx.transcript.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut blocks = Vec::new();
    if let Some(task) = task {
        blocks.push(format!("[Task]\n{task}"));
    }
    if let Some(transcript) = transcript {
        blocks.push(format!("[Transcript]\n{transcript}"));
    }

    if blocks.is_empty() {
        return SectionOutput::gated(
            SectionId::TaskContext,
            CacheClass::Volatile,
            "no task description or transcript provided",
        );
    }
    SectionOutput::included(SectionId::TaskContext, blocks.join("\n\n"), CacheClass::Volatile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptward_core::Purpose;

    #[test]
    fn renders_task_then_transcript() {
        let ctx = Context::new(Purpose::IntentExtraction, "s", "u")
            .with_transcript("uh can you book a table for two")
            .with_task("interpret the utterance");
        let out = task_context(&ctx);
        let content = out.content();
        assert!(content.find("[Task]").unwrap() < content.find("[Transcript]").unwrap());
        assert!(content.contains("book a table for two"));
    }

    #[test]
    fn gated_without_input() {
        let out = task_context(&Context::new(Purpose::Planning, "s", "u").with_transcript("   "));
        assert!(!out.is_included());
        assert_eq!(out.gating_reason(), Some("no task description or transcript provided"));
    }
}
