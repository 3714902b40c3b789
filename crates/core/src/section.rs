//! Section identifiers and section outputs.
//!
//! A section is one logical block of prompt content. Generators turn a
//! [`Context`](crate::Context) into a [`SectionOutput`]; the orchestrator
//! orders, budgets and hashes them.

use crate::message::Role;
use crate::token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical prompt block. Closed set.
///
/// Declaration order is significant: it breaks priority ties when sections
/// are ordered for the final message sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    Identity,
    PurposeContract,
    SafetyConstraints,
    OutputSchema,
    Tooling,
    SkillsIndex,
    WorkspaceBootstrap,
    RuntimeCapabilities,
    MemoryRecall,
    Dimensions,
    TaskContext,
}

impl SectionId {
    pub const ALL: [SectionId; 11] = [
        SectionId::Identity,
        SectionId::PurposeContract,
        SectionId::SafetyConstraints,
        SectionId::OutputSchema,
        SectionId::Tooling,
        SectionId::SkillsIndex,
        SectionId::WorkspaceBootstrap,
        SectionId::RuntimeCapabilities,
        SectionId::MemoryRecall,
        SectionId::Dimensions,
        SectionId::TaskContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::PurposeContract => "purpose-contract",
            Self::SafetyConstraints => "safety-constraints",
            Self::OutputSchema => "output-schema",
            Self::Tooling => "tooling",
            Self::SkillsIndex => "skills-index",
            Self::WorkspaceBootstrap => "workspace-bootstrap",
            Self::RuntimeCapabilities => "runtime-capabilities",
            Self::MemoryRecall => "memory-recall",
            Self::Dimensions => "dimensions",
            Self::TaskContext => "task-context",
        }
    }

    /// Default ordering priority (lower sorts earlier).
    pub fn default_priority(&self) -> i32 {
        match self {
            Self::Identity => 0,
            Self::PurposeContract => 10,
            Self::SafetyConstraints => 20,
            Self::OutputSchema => 30,
            Self::Tooling => 40,
            Self::SkillsIndex => 50,
            Self::WorkspaceBootstrap => 60,
            Self::RuntimeCapabilities => 70,
            Self::MemoryRecall => 80,
            Self::Dimensions => 90,
            Self::TaskContext => 100,
        }
    }

    /// Whether this section belongs to the leading system block of an artifact.
    pub fn leads_system_block(&self) -> bool {
        matches!(self, Self::Identity | Self::PurposeContract)
    }

    /// The message role this section is rendered under.
    ///
    /// Request-derived material speaks as the user; instructions speak as the system.
    pub fn role(&self) -> Role {
        match self {
            Self::MemoryRecall | Self::Dimensions | Self::TaskContext => Role::User,
            _ => Role::System,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

/// How often a section's content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheClass {
    /// Independent of the request.
    Stable,
    /// Changes slowly (per user, per caller).
    Semistable,
    /// Changes per request.
    Volatile,
}

impl CacheClass {
    /// Whether content of this class participates in the stable hash.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Stable | Self::Semistable)
    }
}

/// What to do when a required section's generator has nothing to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredEmpty {
    /// Record the gating reason and omit the section.
    #[default]
    Degrade,
    /// Abort the build.
    Fail,
}

/// The result of generating one section for one context.
///
/// Invariant: when `included` is false, `content` is empty and
/// `gating_reason` is non-empty. The constructors are the only way to
/// build one, so the invariant holds for every value in the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutput {
    id: SectionId,
    content: String,
    priority: i32,
    cache_class: CacheClass,
    tokens: usize,
    included: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gating_reason: Option<String>,
}

impl SectionOutput {
    /// An included section with the id's default priority.
    ///
    /// Empty content is not a valid inclusion; it is turned into a gated
    /// output so downstream code never sees an included-but-empty block.
    pub fn included(id: SectionId, content: impl Into<String>, cache_class: CacheClass) -> Self {
        let content = content.into();
        if content.trim().is_empty() {
            return Self::gated(id, cache_class, "generator produced empty content");
        }
        Self {
            id,
            tokens: token::estimate_tokens(&content),
            content,
            priority: id.default_priority(),
            cache_class,
            included: true,
            gating_reason: None,
        }
    }

    /// An excluded section carrying the reason it was gated.
    pub fn gated(id: SectionId, cache_class: CacheClass, reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        if reason.trim().is_empty() {
            reason = "excluded without a stated reason".into();
        }
        Self {
            id,
            content: String::new(),
            priority: id.default_priority(),
            cache_class,
            tokens: 0,
            included: false,
            gating_reason: Some(reason),
        }
    }

    /// Override the ordering priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Exclude a previously included section (e.g. to fit a token budget).
    pub fn exclude(self, reason: impl Into<String>) -> Self {
        Self::gated(self.id, self.cache_class, reason).with_priority(self.priority)
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn cache_class(&self) -> CacheClass {
        self.cache_class
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn gating_reason(&self) -> Option<&str> {
        self.gating_reason.as_deref()
    }
}
