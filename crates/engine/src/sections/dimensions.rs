//! Dimensions section: the session's accumulated slots and signals.

use promptward_core::{CacheClass, Context, SectionId, SectionOutput};

pub fn dimensions(ctx: &Context) -> SectionOutput {
    let Some(dims) = &ctx.dimensions else {
        return SectionOutput::gated(
            SectionId::Dimensions,
            CacheClass::Volatile,
            "no dimensions tracked for this session",
        );
    };

    let mut content = format!(
        "[Dimensions]\nSlots ({:.0}% complete):\n",
        dims.completeness() * 100.0
    );
    for (name, value) in dims.slots.entries() {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => content.push_str(&format!("- {name}: {v}\n")),
            None => content.push_str(&format!("- {name}: (unknown)\n")),
        }
    }
    content.push_str("Signals (0-1, smoothed):\n");
    for (name, value) in dims.signals.entries() {
        content.push_str(&format!("- {name}: {value:.2}\n"));
    }

    SectionOutput::included(SectionId::Dimensions, content.trim_end(), CacheClass::Volatile)
}
