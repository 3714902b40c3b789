//! Memory-recall section.
//!
//! Snippets are rendered in separate provenance tiers so the model can tell
//! a confirmed fact from an observed signal from a model-inferred guess.
//! Within a tier, snippets are ordered by relevance distance (ties by text),
//! which keeps the rendering independent of the order recall returned them in.

use promptward_core::{CacheClass, Context, MemorySnippet, Provenance, SectionId, SectionOutput};

/// Maximum snippets rendered per provenance tier.
pub const MAX_SNIPPETS_PER_TIER: usize = 8;

const TIERS: [(Provenance, &str); 3] = [
    (Provenance::Confirmed, "authoritative"),
    (Provenance::Observed, "use as a hint; may be outdated"),
    (Provenance::Inferred, "speculative; never act on it without confirmation"),
];

pub fn memory_recall(ctx: &Context) -> SectionOutput {
    if ctx.memory_snippets.is_empty() {
        return SectionOutput::gated(
            SectionId::MemoryRecall,
            CacheClass::Volatile,
            "no memory context available",
        );
    }

    let mut content = String::from("[Memory]\n");
    for (tier, guidance) in TIERS {
        let mut snippets: Vec<&MemorySnippet> = ctx
            .memory_snippets
            .iter()
            .filter(|s| s.provenance == tier)
            .collect();
        if snippets.is_empty() {
            continue;
        }
        snippets.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.text.cmp(&b.text)));

        content.push_str(&format!("\n{} ({guidance}):\n", tier.label()));
        for snippet in snippets.iter().take(MAX_SNIPPETS_PER_TIER) {
            content.push_str(&format!("- {}", snippet.text.trim()));
            match snippet.graph_neighbors {
                Some(n) if n > 0 => content.push_str(&format!(" [distance {:.3}, {n} linked]\n", snippet.distance)),
                _ => content.push_str(&format!(" [distance {:.3}]\n", snippet.distance)),
            }
        }
        if snippets.len() > MAX_SNIPPETS_PER_TIER {
            content.push_str(&format!(
                "({} less relevant item(s) omitted)\n",
                snippets.len() - MAX_SNIPPETS_PER_TIER
            ));
        }
    }

    SectionOutput::included(SectionId::MemoryRecall, content.trim_end(), CacheClass::Volatile)
}
