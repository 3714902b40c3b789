//! Prompt orchestrator: compiles a context into an artifact and a report.
//!
//! # Algorithm
//!
//! 1. Validate the context and snapshot the current policy.
//! 2. Generate every candidate section (required ∪ optional − banned).
//! 3. Apply the policy's required-empty mode.
//! 4. Order by priority, ties by section declaration order.
//! 5. Drop optional sections, highest priority number first, until the
//!    token budget fits; flag `over_budget` if required sections alone
//!    exceed it.
//! 6. Hash, assemble messages, seal.
//! 7. Persist the report. A build whose report cannot be persisted fails.

use crate::artifact::PromptArtifact;
use crate::hash;
use crate::policy::{PolicyEngine, PolicyTable, PurposePolicy};
use crate::registry::SectionRegistry;
use chrono::Utc;
use promptward_core::token::estimate_messages_tokens;
use promptward_core::{
    Context, EngineError, Message, PromptReport, ReportStore, RequiredEmpty, SectionId, SectionOutput,
};
use promptward_security::{AuditEvent, AuditOutcome, ComplianceLog, SealKey};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Actor name used in compliance entries written by the orchestrator.
const ACTOR: &str = "orchestrator";

pub struct Orchestrator {
    registry: SectionRegistry,
    policies: PolicyEngine,
    store: Arc<dyn ReportStore>,
    seal: SealKey,
    compliance: Arc<ComplianceLog>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("policy_version", &self.policies.snapshot().version())
            .field("store", &self.store.name())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator. Fails if any policy names a section with no
    /// registered generator.
    pub fn new(
        registry: SectionRegistry,
        table: PolicyTable,
        store: Arc<dyn ReportStore>,
        seal: SealKey,
        compliance: Arc<ComplianceLog>,
    ) -> Result<Self, EngineError> {
        Self::self_check(&registry, &table)?;
        info!(
            sections = registry.len(),
            policy_version = table.version(),
            store = store.name(),
            "Orchestrator ready"
        );
        Ok(Self {
            registry,
            policies: PolicyEngine::new(table),
            store,
            seal,
            compliance,
        })
    }

    /// Every section named by every policy must have a generator.
    pub fn self_check(registry: &SectionRegistry, table: &PolicyTable) -> Result<(), EngineError> {
        for policy in table.policies() {
            if let Some(missing) = policy
                .referenced_sections()
                .into_iter()
                .find(|id| !registry.contains(*id))
            {
                return Err(EngineError::UnregisteredSection(missing));
            }
        }
        Ok(())
    }

    pub fn policies(&self) -> &PolicyEngine {
        &self.policies
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Atomically replace the policy table and record the swap.
    ///
    /// The new table must pass the same self-check as at startup and must
    /// carry a higher version than the current one. Builds already running
    /// finish against the table they started with.
    pub fn replace_policies(&self, table: PolicyTable, reason: &str) -> Result<u64, EngineError> {
        Self::self_check(&self.registry, &table)?;
        let current = self.policies.snapshot().version();
        if table.version() <= current {
            return Err(EngineError::InvalidContext(format!(
                "policy table version {} must be greater than current version {current}",
                table.version()
            )));
        }
        let to_version = table.version();
        let previous = self.policies.swap(table);
        self.compliance.log(
            AuditEvent::PolicySwap {
                from_version: previous.version(),
                to_version,
            },
            ACTOR,
            "policy-table",
            AuditOutcome::Success,
            Some(reason.to_string()),
        );
        info!(from = previous.version(), to = to_version, reason, "Policy table replaced");
        Ok(to_version)
    }

    /// Compile `ctx` into a sealed artifact and its persisted report.
    pub async fn build(&self, ctx: &Context) -> Result<(PromptArtifact, PromptReport), EngineError> {
        ctx.validate()?;

        let table = self.policies.snapshot();
        let policy = table.policy_for(ctx.purpose)?;
        let scoped = scope_tools(ctx, &policy);

        // ── Generate ───────────────────────────────────────────────────
        let mut sections = Vec::new();
        for id in policy.candidates() {
            let output = self.registry.generate(id, &scoped)?;
            debug!(
                section = %id,
                included = output.is_included(),
                tokens = output.tokens(),
                reason = output.gating_reason().unwrap_or(""),
                "Section generated"
            );
            sections.push(output);
        }

        // ── Required-but-empty ─────────────────────────────────────────
        for output in sections.iter().filter(|s| !s.is_included() && policy.required.contains(&s.id())) {
            let reason = output.gating_reason().unwrap_or_default().to_string();
            match policy.required_empty {
                RequiredEmpty::Fail => {
                    return Err(EngineError::RequiredSectionEmpty {
                        section: output.id(),
                        reason,
                    });
                }
                RequiredEmpty::Degrade => {
                    warn!(purpose = %ctx.purpose, section = %output.id(), %reason, "Required section empty, omitted");
                }
            }
        }

        // ── Order ──────────────────────────────────────────────────────
        sections.sort_by_key(|s| (s.priority(), s.id()));

        // ── Budget ─────────────────────────────────────────────────────
        let over_budget = enforce_budget(&mut sections, &policy);

        // ── Assemble ───────────────────────────────────────────────────
        let messages = assemble_messages(&sections);
        let total_tokens = estimate_messages_tokens(&messages);
        let stable_hash = hash::stable_hash(&sections);
        let volatile_hash = hash::volatile_hash(&sections);
        let prompt_id = uuid::Uuid::new_v4().to_string();

        let artifact = PromptArtifact::sealed(
            prompt_id.clone(),
            ctx.purpose,
            messages,
            stable_hash.clone(),
            volatile_hash.clone(),
            total_tokens,
            &self.seal,
        );

        let report = PromptReport {
            prompt_id,
            purpose: ctx.purpose,
            session_id: ctx.session_id.clone(),
            user_id: ctx.user_id.clone(),
            sections,
            banned_sections: policy.banned.iter().copied().collect(),
            stable_hash,
            volatile_hash,
            tokens_used: total_tokens,
            token_budget: policy.token_budget,
            over_budget,
            policy_version: table.version(),
            created_at: Utc::now(),
        };

        // ── Persist ────────────────────────────────────────────────────
        self.store.save(&report).await?;

        info!(
            prompt_id = %report.prompt_id,
            purpose = %report.purpose,
            tokens = report.tokens_used,
            budget = report.token_budget,
            over_budget,
            "Prompt built"
        );
        Ok((artifact, report))
    }
}

/// Narrow the context's tools to those the policy allows. Borrows when
/// nothing needs removing.
fn scope_tools<'a>(ctx: &'a Context, policy: &PurposePolicy) -> Cow<'a, Context> {
    if ctx.available_tools.iter().all(|t| policy.is_tool_allowed(t)) {
        return Cow::Borrowed(ctx);
    }
    let (allowed, rejected): (Vec<String>, Vec<String>) = ctx
        .available_tools
        .iter()
        .cloned()
        .partition(|t| policy.is_tool_allowed(t));
    debug!(purpose = %ctx.purpose, ?rejected, "Tools not permitted for purpose");
    let mut scoped = ctx.clone();
    scoped.available_tools = allowed;
    Cow::Owned(scoped)
}

/// Drop optional sections until the assembled prompt fits. Returns whether
/// the prompt is still over budget.
fn enforce_budget(sections: &mut [SectionOutput], policy: &PurposePolicy) -> bool {
    loop {
        let used = estimate_messages_tokens(&assemble_messages(sections));
        if used <= policy.token_budget {
            return false;
        }

        // Last in order = highest priority number.
        let victim = sections
            .iter()
            .rposition(|s| s.is_included() && !policy.required.contains(&s.id()));
        let Some(idx) = victim else {
            warn!(
                purpose = %policy.purpose,
                used,
                budget = policy.token_budget,
                "Required sections exceed token budget"
            );
            return true;
        };

        let reason = format!(
            "dropped to fit token budget ({used} > {})",
            policy.token_budget
        );
        debug!(section = %sections[idx].id(), %reason, "Section dropped");
        sections[idx] = sections[idx].clone().exclude(reason);
    }
}

/// Identity and purpose contract form one leading system message; every
/// other included section follows in order under its own role.
fn assemble_messages(sections: &[SectionOutput]) -> Vec<Message> {
    let included = || sections.iter().filter(|s| s.is_included());

    let leading: Vec<&str> = included()
        .filter(|s| s.id().leads_system_block())
        .map(SectionOutput::content)
        .collect();

    let mut messages = Vec::new();
    if !leading.is_empty() {
        messages.push(Message::system(leading.join("\n\n")));
    }
    for section in included().filter(|s| !s.id().leads_system_block()) {
        messages.push(Message::new(section.id().role(), section.content()));
    }
    messages
}

/// Ids of the sections present in the artifact, in order.
pub fn included_ids(report: &PromptReport) -> Vec<SectionId> {
    report.included_sections().map(SectionOutput::id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::default_registry;
    use async_trait::async_trait;
    use promptward_core::{CacheClass, MemorySnippet, Provenance, Purpose, Role, StoreError};
    use promptward_store::InMemoryReportStore;

    fn orchestrator_with(table: PolicyTable, store: Arc<dyn ReportStore>) -> Orchestrator {
        Orchestrator::new(
            default_registry(),
            table,
            store,
            SealKey::generate().unwrap(),
            Arc::new(ComplianceLog::new()),
        )
        .unwrap()
    }

    fn orchestrator() -> (Orchestrator, Arc<InMemoryReportStore>) {
        let store = Arc::new(InMemoryReportStore::new());
        (
            orchestrator_with(PolicyTable::builtin(RequiredEmpty::Degrade), store.clone()),
            store,
        )
    }

    fn intent_ctx() -> Context {
        Context::new(Purpose::IntentExtraction, "session-1", "user-1")
            .with_transcript("can you book a table for two at eight")
            .with_tools(["calendar", "payments"])
    }

    struct FailingStore;

    #[async_trait]
    impl ReportStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }
        async fn save(&self, _report: &PromptReport) -> Result<(), StoreError> {
            Err(StoreError::Persistence("disk full".into()))
        }
        async fn find_by_prompt_id(&self, _id: &str) -> Result<Option<PromptReport>, StoreError> {
            Ok(None)
        }
        async fn scan_recent(&self, _limit: usize) -> Result<Vec<PromptReport>, StoreError> {
            Ok(vec![])
        }
        async fn count(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn builds_and_persists_report() {
        let (orch, store) = orchestrator();
        let (artifact, report) = orch.build(&intent_ctx()).await.unwrap();

        assert_eq!(artifact.prompt_id(), report.prompt_id);
        assert_eq!(artifact.purpose(), Purpose::IntentExtraction);
        assert_eq!(artifact.total_tokens(), report.tokens_used);
        assert_eq!(report.policy_version, 1);

        let stored = store.find_by_prompt_id(&report.prompt_id).await.unwrap().unwrap();
        assert_eq!(stored, report);
    }

    #[tokio::test]
    async fn leading_system_block_holds_identity_and_contract() {
        let (orch, _) = orchestrator();
        let (artifact, _) = orch.build(&intent_ctx()).await.unwrap();
        let first = &artifact.messages()[0];
        assert_eq!(first.role, Role::System);
        assert!(first.content.starts_with("[Identity]"));
        assert!(first.content.contains("[Contract: intent-extraction]"));
        let last = artifact.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("book a table"));
    }

    #[tokio::test]
    async fn banned_sections_are_never_attempted() {
        let (orch, _) = orchestrator();
        let (artifact, report) = orch.build(&intent_ctx()).await.unwrap();
        assert!(report.section(SectionId::Tooling).is_none());
        assert!(report.banned_sections.contains(&SectionId::Tooling));
        assert!(artifact.messages().iter().all(|m| !m.content.contains("[Tools]")));
    }

    #[tokio::test]
    async fn invalid_context_is_rejected_before_generation() {
        let (orch, store) = orchestrator();
        let ctx = Context::new(Purpose::Planning, "", "user");
        assert!(matches!(orch.build(&ctx).await, Err(EngineError::InvalidContext(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_purpose_fails() {
        let table = PolicyTable::new(1, [PurposePolicy::new(Purpose::Planning, 100)]).unwrap();
        let orch = orchestrator_with(table, Arc::new(InMemoryReportStore::new()));
        let err = orch.build(&intent_ctx()).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownPurpose(Purpose::IntentExtraction)));
    }

    #[tokio::test]
    async fn required_empty_degrades_by_default() {
        let (orch, _) = orchestrator();
        let ctx = Context::new(Purpose::Summarization, "s", "u");
        let (_, report) = orch.build(&ctx).await.unwrap();
        let task = report.section(SectionId::TaskContext).unwrap();
        assert!(!task.is_included());
        assert!(task.gating_reason().is_some());
    }

    #[tokio::test]
    async fn required_empty_fail_mode_aborts_without_persisting() {
        let store = Arc::new(InMemoryReportStore::new());
        let orch = orchestrator_with(PolicyTable::builtin(RequiredEmpty::Fail), store.clone());
        let ctx = Context::new(Purpose::Summarization, "s", "u");
        let err = orch.build(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::RequiredSectionEmpty {
                section: SectionId::TaskContext,
                ..
            }
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_fails_build() {
        let orch = orchestrator_with(PolicyTable::builtin(RequiredEmpty::Degrade), Arc::new(FailingStore));
        let err = orch.build(&intent_ctx()).await.unwrap_err();
        assert!(matches!(err, EngineError::Persistence(StoreError::Persistence(_))));
    }

    #[tokio::test]
    async fn disallowed_tools_are_not_rendered() {
        let store = Arc::new(InMemoryReportStore::new());
        let table = PolicyTable::new(
            1,
            [PurposePolicy::new(Purpose::Execution, 10_000)
                .require([SectionId::Identity, SectionId::TaskContext])
                .allow_optional([SectionId::Tooling])
                .allow_tools(["calendar"])],
        )
        .unwrap();
        let orch = orchestrator_with(table, store);
        let ctx = Context::new(Purpose::Execution, "s", "u")
            .with_task("add lunch to my calendar")
            .with_tools(["calendar", "payments"]);
        let (artifact, _) = orch.build(&ctx).await.unwrap();
        let tools = artifact
            .messages()
            .iter()
            .find(|m| m.content.starts_with("[Tools]"))
            .unwrap();
        assert!(tools.content.contains("calendar"));
        assert!(!tools.content.contains("payments"));
    }

    #[tokio::test]
    async fn memory_is_rendered_when_present() {
        let (orch, _) = orchestrator();
        let ctx = intent_ctx().with_memory(vec![MemorySnippet::new(
            "prefers window seats",
            Provenance::Confirmed,
            0.2,
        )]);
        let (_, report) = orch.build(&ctx).await.unwrap();
        assert!(report.section(SectionId::MemoryRecall).unwrap().is_included());
        assert!(included_ids(&report).contains(&SectionId::MemoryRecall));
    }

    #[tokio::test]
    async fn custom_priority_reorders_sections() {
        let mut registry = default_registry();
        registry.replace(SectionId::MemoryRecall, |_: &Context| {
            SectionOutput::included(SectionId::MemoryRecall, "[Memory]\n- early", CacheClass::Volatile)
                .with_priority(15)
        });
        let orch = Orchestrator::new(
            registry,
            PolicyTable::builtin(RequiredEmpty::Degrade),
            Arc::new(InMemoryReportStore::new()),
            SealKey::generate().unwrap(),
            Arc::new(ComplianceLog::new()),
        )
        .unwrap();
        let (_, report) = orch.build(&intent_ctx()).await.unwrap();
        let ids = included_ids(&report);
        let memory = ids.iter().position(|id| *id == SectionId::MemoryRecall).unwrap();
        let schema = ids.iter().position(|id| *id == SectionId::OutputSchema).unwrap();
        assert!(memory < schema);
    }

    #[test]
    fn self_check_rejects_unregistered_sections() {
        let mut registry = SectionRegistry::new();
        registry
            .register(SectionId::Identity, |_: &Context| {
                SectionOutput::included(SectionId::Identity, "x", CacheClass::Stable)
            })
            .unwrap();
        let table = PolicyTable::builtin(RequiredEmpty::Degrade);
        let err = Orchestrator::self_check(&registry, &table).unwrap_err();
        assert!(matches!(err, EngineError::UnregisteredSection(_)));
    }

    #[tokio::test]
    async fn replace_policies_swaps_and_audits() {
        let compliance = Arc::new(ComplianceLog::new());
        let orch = Orchestrator::new(
            default_registry(),
            PolicyTable::builtin(RequiredEmpty::Degrade),
            Arc::new(InMemoryReportStore::new()),
            SealKey::generate().unwrap(),
            compliance.clone(),
        )
        .unwrap();

        let next = orch
            .policies()
            .snapshot()
            .with_overrides([PurposePolicy::new(Purpose::IntentExtraction, 5_000)
                .require([SectionId::Identity, SectionId::TaskContext])])
            .unwrap();
        assert_eq!(orch.replace_policies(next, "trim intent prompt").unwrap(), 2);

        let (_, report) = orch.build(&intent_ctx()).await.unwrap();
        assert_eq!(report.policy_version, 2);
        assert!(report.section(SectionId::OutputSchema).is_none());

        let entries = compliance.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].event,
            AuditEvent::PolicySwap {
                from_version: 1,
                to_version: 2
            }
        );
        assert_eq!(entries[0].details.as_deref(), Some("trim intent prompt"));
    }

    #[test]
    fn replace_policies_rejects_stale_version() {
        let (orch, _) = orchestrator();
        let stale = PolicyTable::builtin(RequiredEmpty::Degrade);
        assert!(orch.replace_policies(stale, "noop").is_err());
        assert_eq!(orch.policies().snapshot().version(), 1);
    }

    #[test]
    fn replace_policies_rejects_unregistered_sections() {
        let mut registry = SectionRegistry::new();
        for id in [SectionId::Identity, SectionId::TaskContext] {
            registry
                .register(id, move |_: &Context| SectionOutput::included(id, "x", CacheClass::Stable))
                .unwrap();
        }
        let table = PolicyTable::new(
            1,
            [PurposePolicy::new(Purpose::Planning, 100).require([SectionId::Identity, SectionId::TaskContext])],
        )
        .unwrap();
        let orch = Orchestrator::new(
            registry,
            table,
            Arc::new(InMemoryReportStore::new()),
            SealKey::generate().unwrap(),
            Arc::new(ComplianceLog::new()),
        )
        .unwrap();
        let next = orch
            .policies()
            .snapshot()
            .with_overrides([PurposePolicy::new(Purpose::Planning, 100).require([SectionId::Tooling])])
            .unwrap();
        assert!(matches!(
            orch.replace_policies(next, "adds tooling"),
            Err(EngineError::UnregisteredSection(SectionId::Tooling))
        ));
    }
}
