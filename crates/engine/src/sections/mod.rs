//! Built-in section generators.
//!
//! Every generator is a plain `fn(&Context) -> SectionOutput`. Content that
//! depends only on the purpose is `Stable`; content derived from the caller's
//! environment (tools, skills, workspace, runtime) is `Semistable`; content
//! derived from the request itself is `Volatile`.

pub mod dimensions;
pub mod identity;
pub mod memory;
pub mod schema;
pub mod task;
pub mod tooling;
pub mod workspace;

use crate::registry::SectionRegistry;
use promptward_core::SectionId;

/// Create a registry with a generator for every section id.
pub fn default_registry() -> SectionRegistry {
    let mut registry = SectionRegistry::new();
    registry.replace(SectionId::Identity, identity::identity);
    registry.replace(SectionId::PurposeContract, identity::purpose_contract);
    registry.replace(SectionId::SafetyConstraints, schema::safety_constraints);
    registry.replace(SectionId::OutputSchema, schema::output_schema);
    registry.replace(SectionId::Tooling, tooling::tooling);
    registry.replace(SectionId::SkillsIndex, tooling::skills_index);
    registry.replace(SectionId::WorkspaceBootstrap, workspace::workspace_bootstrap);
    registry.replace(SectionId::RuntimeCapabilities, workspace::runtime_capabilities);
    registry.replace(SectionId::MemoryRecall, memory::memory_recall);
    registry.replace(SectionId::Dimensions, dimensions::dimensions);
    registry.replace(SectionId::TaskContext, task::task_context);
    registry
}
