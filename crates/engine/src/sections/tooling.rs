//! Tool listing and skills index.
//!
//! The orchestrator narrows `available_tools` to the purpose's allowed set
//! before these run, so whatever reaches the tool listing is permitted.

use promptward_core::{CacheClass, Context, SectionId, SectionOutput};

pub fn tooling(ctx: &Context) -> SectionOutput {
    let mut tools: Vec<&str> = ctx
        .available_tools
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    tools.sort_unstable();
    tools.dedup();

    if tools.is_empty() {
        return SectionOutput::gated(
            SectionId::Tooling,
            CacheClass::Semistable,
            "no permitted tools available to this caller",
        );
    }

    let mut content = String::from("[Tools]\nYou may use only these tools:\n");
    for tool in tools {
        content.push_str(&format!("- {tool}\n"));
    }
    SectionOutput::included(SectionId::Tooling, content.trim_end(), CacheClass::Semistable)
}

pub fn skills_index(ctx: &Context) -> SectionOutput {
    if ctx.skills.is_empty() {
        return SectionOutput::gated(
            SectionId::SkillsIndex,
            CacheClass::Semistable,
            "no skills registered for this caller",
        );
    }

    let mut skills: Vec<_> = ctx.skills.iter().collect();
    skills.sort_by(|a, b| a.name.cmp(&b.name));

    let mut content = String::from("[Skills]\n");
    for skill in skills {
        if skill.description.trim().is_empty() {
            content.push_str(&format!("- {}\n", skill.name));
        } else {
            content.push_str(&format!("- {}: {}\n", skill.name, skill.description.trim()));
        }
    }
    SectionOutput::included(SectionId::SkillsIndex, content.trim_end(), CacheClass::Semistable)
}
