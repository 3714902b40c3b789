//! Policy engine: the per-purpose ruleset.
//!
//! A [`PolicyTable`] is an immutable, versioned snapshot. The
//! [`PolicyEngine`] hands out `Arc` snapshots to readers and replaces the
//! whole table on update; no policy is ever patched in place, so every
//! build runs against exactly one table version.

use promptward_core::{EngineError, Purpose, RequiredEmpty, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Tool id that permits every tool.
pub const ANY_TOOL: &str = "*";

// ── Purpose policy ─────────────────────────────────────────────────────────

/// Static rules for one purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposePolicy {
    pub purpose: Purpose,
    pub required: BTreeSet<SectionId>,
    pub optional: BTreeSet<SectionId>,
    pub banned: BTreeSet<SectionId>,
    pub allowed_tools: BTreeSet<String>,
    pub token_budget: usize,
    #[serde(default)]
    pub required_empty: RequiredEmpty,
}

/// How a policy treats one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Required,
    Optional,
    Banned,
    /// Not named by the policy; never attempted
    Unlisted,
}

impl Disposition {
    /// Whether the generator is invoked.
    pub fn is_attempted(&self) -> bool {
        matches!(self, Self::Required | Self::Optional)
    }
}

impl PurposePolicy {
    pub fn new(purpose: Purpose, token_budget: usize) -> Self {
        Self {
            purpose,
            required: BTreeSet::new(),
            optional: BTreeSet::new(),
            banned: BTreeSet::new(),
            allowed_tools: BTreeSet::new(),
            token_budget,
            required_empty: RequiredEmpty::default(),
        }
    }

    pub fn require(mut self, ids: impl IntoIterator<Item = SectionId>) -> Self {
        self.required.extend(ids);
        self
    }

    pub fn allow_optional(mut self, ids: impl IntoIterator<Item = SectionId>) -> Self {
        self.optional.extend(ids);
        self
    }

    pub fn ban(mut self, ids: impl IntoIterator<Item = SectionId>) -> Self {
        self.banned.extend(ids);
        self
    }

    pub fn allow_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn on_required_empty(mut self, mode: RequiredEmpty) -> Self {
        self.required_empty = mode;
        self
    }

    /// Banned wins over required and optional.
    pub fn disposition(&self, id: SectionId) -> Disposition {
        if self.banned.contains(&id) {
            Disposition::Banned
        } else if self.required.contains(&id) {
            Disposition::Required
        } else if self.optional.contains(&id) {
            Disposition::Optional
        } else {
            Disposition::Unlisted
        }
    }

    /// Sections to generate: (required ∪ optional) − banned, in declaration order.
    pub fn candidates(&self) -> Vec<SectionId> {
        self.required
            .union(&self.optional)
            .filter(|id| !self.banned.contains(id))
            .copied()
            .collect()
    }

    pub fn is_tool_allowed(&self, tool: &str) -> bool {
        self.allowed_tools.contains(ANY_TOOL) || self.allowed_tools.contains(tool)
    }

    /// Every section the policy names, for the startup self-check.
    pub fn referenced_sections(&self) -> BTreeSet<SectionId> {
        self.required
            .iter()
            .chain(&self.optional)
            .chain(&self.banned)
            .copied()
            .collect()
    }

    fn check(&self) -> Result<(), EngineError> {
        if let Some(&section) = self.required.intersection(&self.banned).next() {
            return Err(EngineError::PolicyConflict {
                purpose: self.purpose,
                section,
            });
        }
        for section in self.optional.intersection(&self.banned) {
            warn!(
                purpose = %self.purpose,
                section = %section,
                "Section is both optional and banned; it will never be attempted"
            );
        }
        Ok(())
    }
}

// ── Policy table ───────────────────────────────────────────────────────────

/// A versioned, immutable set of purpose policies.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    version: u64,
    policies: HashMap<Purpose, Arc<PurposePolicy>>,
}

impl PolicyTable {
    /// Build a table, rejecting required ∩ banned conflicts. A later policy
    /// for the same purpose replaces an earlier one.
    pub fn new(version: u64, policies: impl IntoIterator<Item = PurposePolicy>) -> Result<Self, EngineError> {
        let mut map = HashMap::new();
        for policy in policies {
            policy.check()?;
            map.insert(policy.purpose, Arc::new(policy));
        }
        Ok(Self {
            version,
            policies: map,
        })
    }

    /// The built-in table (version 1), covering every purpose.
    pub fn builtin(required_empty: RequiredEmpty) -> Self {
        use SectionId::*;

        let policies = [
            PurposePolicy::new(Purpose::IntentExtraction, 2_000)
                .require([Identity, PurposeContract, OutputSchema, TaskContext])
                .allow_optional([SafetyConstraints, MemoryRecall, Dimensions])
                .ban([Tooling, WorkspaceBootstrap]),
            PurposePolicy::new(Purpose::DimensionExtraction, 1_500)
                .require([Identity, PurposeContract, OutputSchema, TaskContext])
                .allow_optional([Dimensions, MemoryRecall])
                .ban([Tooling, SkillsIndex, WorkspaceBootstrap]),
            PurposePolicy::new(Purpose::Planning, 6_000)
                .require([Identity, PurposeContract, SafetyConstraints, OutputSchema, TaskContext])
                .allow_optional([
                    Tooling,
                    SkillsIndex,
                    WorkspaceBootstrap,
                    RuntimeCapabilities,
                    MemoryRecall,
                    Dimensions,
                ])
                .allow_tools([ANY_TOOL]),
            PurposePolicy::new(Purpose::Execution, 8_000)
                .require([Identity, PurposeContract, SafetyConstraints, TaskContext])
                .allow_optional([
                    OutputSchema,
                    Tooling,
                    SkillsIndex,
                    WorkspaceBootstrap,
                    RuntimeCapabilities,
                    MemoryRecall,
                    Dimensions,
                ])
                .allow_tools([ANY_TOOL]),
            PurposePolicy::new(Purpose::Verification, 3_000)
                .require([Identity, PurposeContract, OutputSchema, TaskContext])
                .allow_optional([SafetyConstraints, MemoryRecall, Dimensions])
                .ban([Tooling, SkillsIndex]),
            PurposePolicy::new(Purpose::SafetyClassification, 1_500)
                .require([Identity, PurposeContract, SafetyConstraints, OutputSchema, TaskContext])
                .ban([Tooling, SkillsIndex, WorkspaceBootstrap, MemoryRecall]),
            PurposePolicy::new(Purpose::Summarization, 3_000)
                .require([Identity, PurposeContract, OutputSchema, TaskContext])
                .allow_optional([MemoryRecall])
                .ban([Tooling]),
            PurposePolicy::new(Purpose::SubtaskDelegation, 4_000)
                .require([Identity, PurposeContract, SafetyConstraints, OutputSchema, TaskContext])
                .allow_optional([Tooling, RuntimeCapabilities, Dimensions])
                .ban([MemoryRecall, WorkspaceBootstrap])
                .allow_tools([ANY_TOOL]),
        ];

        let map = policies
            .into_iter()
            .map(|p| (p.purpose, Arc::new(p.on_required_empty(required_empty))))
            .collect();
        Self {
            version: 1,
            policies: map,
        }
    }

    /// A new table (version + 1) with `overrides` replacing the policies
    /// for their purposes.
    pub fn with_overrides(&self, overrides: impl IntoIterator<Item = PurposePolicy>) -> Result<Self, EngineError> {
        let mut policies = self.policies.clone();
        for policy in overrides {
            policy.check()?;
            policies.insert(policy.purpose, Arc::new(policy));
        }
        Ok(Self {
            version: self.version + 1,
            policies,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn policy_for(&self, purpose: Purpose) -> Result<Arc<PurposePolicy>, EngineError> {
        self.policies
            .get(&purpose)
            .cloned()
            .ok_or(EngineError::UnknownPurpose(purpose))
    }

    /// Policies sorted by purpose.
    pub fn policies(&self) -> Vec<Arc<PurposePolicy>> {
        let mut all: Vec<_> = self.policies.values().cloned().collect();
        all.sort_by_key(|p| p.purpose);
        all
    }
}

// ── Policy engine ──────────────────────────────────────────────────────────

/// Process-wide holder of the current policy table.
#[derive(Debug)]
pub struct PolicyEngine {
    table: RwLock<Arc<PolicyTable>>,
}

impl PolicyEngine {
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// The current table. Holders keep their snapshot even across a swap.
    pub fn snapshot(&self) -> Arc<PolicyTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn policy_for(&self, purpose: Purpose) -> Result<Arc<PurposePolicy>, EngineError> {
        self.snapshot().policy_for(purpose)
    }

    pub fn is_tool_allowed(&self, purpose: Purpose, tool: &str) -> Result<bool, EngineError> {
        Ok(self.policy_for(purpose)?.is_tool_allowed(tool))
    }

    pub fn should_attempt(&self, purpose: Purpose, section: SectionId) -> Result<Disposition, EngineError> {
        Ok(self.policy_for(purpose)?.disposition(section))
    }

    /// Replace the whole table, returning the previous one.
    pub(crate) fn swap(&self, table: PolicyTable) -> Arc<PolicyTable> {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_wins_over_required_and_optional() {
        let policy = PurposePolicy::new(Purpose::Planning, 100)
            .allow_optional([SectionId::Tooling])
            .ban([SectionId::Tooling]);
        assert_eq!(policy.disposition(SectionId::Tooling), Disposition::Banned);
        assert!(!policy.candidates().contains(&SectionId::Tooling));
    }

    #[test]
    fn required_and_banned_conflict_rejected() {
        let policy = PurposePolicy::new(Purpose::Planning, 100)
            .require([SectionId::Tooling])
            .ban([SectionId::Tooling]);
        let err = PolicyTable::new(1, [policy]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PolicyConflict {
                purpose: Purpose::Planning,
                section: SectionId::Tooling
            }
        ));
    }

    #[test]
    fn optional_and_banned_overlap_tolerated() {
        let policy = PurposePolicy::new(Purpose::Planning, 100)
            .allow_optional([SectionId::MemoryRecall])
            .ban([SectionId::MemoryRecall]);
        assert!(PolicyTable::new(1, [policy]).is_ok());
    }

    #[test]
    fn candidates_in_declaration_order() {
        let policy = PurposePolicy::new(Purpose::Summarization, 100)
            .require([SectionId::TaskContext, SectionId::Identity])
            .allow_optional([SectionId::MemoryRecall]);
        assert_eq!(
            policy.candidates(),
            vec![SectionId::Identity, SectionId::MemoryRecall, SectionId::TaskContext]
        );
        assert_eq!(policy.disposition(SectionId::Dimensions), Disposition::Unlisted);
        assert!(!Disposition::Unlisted.is_attempted());
    }

    #[test]
    fn builtin_covers_every_purpose() {
        let table = PolicyTable::builtin(RequiredEmpty::Degrade);
        for purpose in Purpose::ALL {
            let policy = table.policy_for(purpose).unwrap();
            assert!(policy.required.is_disjoint(&policy.banned), "{purpose}");
            assert!(policy.token_budget > 0);
        }
        assert_eq!(table.version(), 1);
    }

    #[test]
    fn builtin_intent_policy_bans_tooling() {
        let table = PolicyTable::builtin(RequiredEmpty::Degrade);
        let policy = table.policy_for(Purpose::IntentExtraction).unwrap();
        assert_eq!(policy.disposition(SectionId::Tooling), Disposition::Banned);
        assert_eq!(policy.disposition(SectionId::MemoryRecall), Disposition::Optional);
        assert!(!policy.is_tool_allowed("calendar"));
    }

    #[test]
    fn wildcard_allows_any_tool() {
        let engine = PolicyEngine::new(PolicyTable::builtin(RequiredEmpty::Degrade));
        assert!(engine.is_tool_allowed(Purpose::Execution, "anything").unwrap());
        assert!(!engine.is_tool_allowed(Purpose::Summarization, "anything").unwrap());
    }

    #[test]
    fn unknown_purpose_fails() {
        let engine = PolicyEngine::new(PolicyTable::new(1, []).unwrap());
        let err = engine.policy_for(Purpose::Planning).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPurpose(Purpose::Planning)));
    }

    #[test]
    fn swap_replaces_whole_table_and_keeps_old_snapshots() {
        let engine = PolicyEngine::new(PolicyTable::builtin(RequiredEmpty::Degrade));
        let before = engine.snapshot();
        let next = before
            .with_overrides([PurposePolicy::new(Purpose::Planning, 10).require([SectionId::Identity])])
            .unwrap();
        let old = engine.swap(next);

        assert_eq!(old.version(), 1);
        assert_eq!(engine.snapshot().version(), 2);
        assert_eq!(before.policy_for(Purpose::Planning).unwrap().token_budget, 6_000);
        assert_eq!(engine.policy_for(Purpose::Planning).unwrap().token_budget, 10);
        assert_eq!(
            engine.should_attempt(Purpose::Planning, SectionId::Tooling).unwrap(),
            Disposition::Unlisted
        );
    }
}
