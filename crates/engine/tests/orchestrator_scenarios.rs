//! End-to-end builds against the built-in policy table.

use promptward_core::{
    CacheClass, Context, EngineError, MemorySnippet, Provenance, Purpose, ReportStore, RequiredEmpty,
    SectionId, SectionOutput, WorkspaceFile,
};
use promptward_engine::{Orchestrator, PolicyTable, PurposePolicy, default_registry};
use promptward_security::{ComplianceLog, SealKey};
use promptward_store::InMemoryReportStore;
use std::sync::Arc;

fn orchestrator(table: PolicyTable) -> (Orchestrator, Arc<InMemoryReportStore>, SealKey) {
    let store = Arc::new(InMemoryReportStore::new());
    let key = SealKey::generate().unwrap();
    let orch = Orchestrator::new(
        default_registry(),
        table,
        store.clone(),
        key.clone(),
        Arc::new(ComplianceLog::new()),
    )
    .unwrap();
    (orch, store, key)
}

fn builtin() -> (Orchestrator, Arc<InMemoryReportStore>, SealKey) {
    orchestrator(PolicyTable::builtin(RequiredEmpty::Degrade))
}

#[tokio::test]
async fn intent_extraction_excludes_tooling_and_reports_missing_memory() {
    let (orch, _, key) = builtin();
    let ctx = Context::new(Purpose::IntentExtraction, "session-a", "user-a")
        .with_transcript("remind me to call mum tomorrow")
        .with_tools(["calendar", "reminders"]);

    let (artifact, report) = orch.build(&ctx).await.unwrap();

    assert!(artifact.verify_seal(&key));
    assert!(report.section(SectionId::Tooling).is_none());
    assert!(report.banned_sections.contains(&SectionId::Tooling));
    assert!(
        artifact
            .messages()
            .iter()
            .all(|m| !m.content.contains("calendar"))
    );

    let memory = report.section(SectionId::MemoryRecall).unwrap();
    assert!(!memory.is_included());
    assert_eq!(memory.gating_reason(), Some("no memory context available"));

    for required in [
        SectionId::Identity,
        SectionId::PurposeContract,
        SectionId::OutputSchema,
        SectionId::TaskContext,
    ] {
        assert!(report.section(required).unwrap().is_included(), "{required} missing");
    }
}

#[tokio::test]
async fn generator_cannot_smuggle_a_banned_section() {
    let mut registry = default_registry();
    registry.replace(SectionId::MemoryRecall, |_: &Context| {
        SectionOutput::included(SectionId::Tooling, "[Tools]\n- payments", CacheClass::Semistable)
    });
    let store = Arc::new(InMemoryReportStore::new());
    let orch = Orchestrator::new(
        registry,
        PolicyTable::builtin(RequiredEmpty::Degrade),
        store.clone(),
        SealKey::generate().unwrap(),
        Arc::new(ComplianceLog::new()),
    )
    .unwrap();
    let ctx = Context::new(Purpose::IntentExtraction, "session-a", "user-a")
        .with_transcript("pay the electricity bill");

    let err = orch.build(&ctx).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::MislabelledSection {
            expected: SectionId::MemoryRecall,
            produced: SectionId::Tooling,
        }
    ));
    assert!(store.scan_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn session_id_does_not_affect_hashes() {
    let (orch, _, _) = builtin();
    let memory = vec![MemorySnippet::new("lives in Porto", Provenance::Confirmed, 0.1)];
    let a = Context::new(Purpose::IntentExtraction, "session-a", "user")
        .with_transcript("order groceries")
        .with_memory(memory.clone());
    let mut b = a.clone();
    b.session_id = "session-b".into();

    let (art_a, rep_a) = orch.build(&a).await.unwrap();
    let (art_b, rep_b) = orch.build(&b).await.unwrap();

    assert_eq!(rep_a.stable_hash, rep_b.stable_hash);
    assert_eq!(rep_a.volatile_hash, rep_b.volatile_hash);
    assert_eq!(art_a.messages(), art_b.messages());
    assert_ne!(rep_a.prompt_id, rep_b.prompt_id);
}

#[tokio::test]
async fn volatile_change_keeps_stable_hash() {
    let (orch, _, _) = builtin();
    let a = Context::new(Purpose::Verification, "s", "u").with_task("check the booking");
    let b = Context::new(Purpose::Verification, "s", "u").with_task("check the refund");

    let (_, rep_a) = orch.build(&a).await.unwrap();
    let (_, rep_b) = orch.build(&b).await.unwrap();

    assert_eq!(rep_a.stable_hash, rep_b.stable_hash);
    assert_ne!(rep_a.volatile_hash, rep_b.volatile_hash);
}

#[tokio::test]
async fn identical_contexts_build_identical_prompts() {
    let (orch, _, _) = builtin();
    let ctx = Context::new(Purpose::Planning, "s", "u")
        .with_task("plan a weekend trip")
        .with_tools(["weather", "maps", "weather"])
        .with_workspace_files(vec![WorkspaceFile {
            path: "PREFERENCES.md".into(),
            content: "prefers trains".into(),
        }]);

    let (first, first_report) = orch.build(&ctx).await.unwrap();
    for _ in 0..3 {
        let (again, again_report) = orch.build(&ctx).await.unwrap();
        assert_eq!(again.messages(), first.messages());
        assert_eq!(again_report.stable_hash, first_report.stable_hash);
        assert_eq!(again_report.volatile_hash, first_report.volatile_hash);
        assert_eq!(again_report.tokens_used, first_report.tokens_used);
    }
}

#[tokio::test]
async fn report_accounts_for_every_candidate_in_order() {
    let (orch, store, _) = builtin();
    let ctx = Context::new(Purpose::Execution, "s", "u").with_task("send the invoice");

    let (_, report) = orch.build(&ctx).await.unwrap();
    let policy = orch.policies().policy_for(Purpose::Execution).unwrap();

    assert_eq!(report.sections.len(), policy.candidates().len());
    for section in &report.sections {
        assert!(section.is_included() || section.gating_reason().is_some());
    }
    let priorities: Vec<_> = report.sections.iter().map(|s| s.priority()).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.scan_recent(1).await.unwrap()[0], report);
}

fn budget_table(budget: usize) -> PolicyTable {
    PolicyTable::new(
        1,
        [PurposePolicy::new(Purpose::Planning, budget)
            .require([SectionId::Identity, SectionId::PurposeContract, SectionId::TaskContext])
            .allow_optional([SectionId::WorkspaceBootstrap, SectionId::MemoryRecall])],
    )
    .unwrap()
}

fn budget_ctx() -> Context {
    Context::new(Purpose::Planning, "s", "u")
        .with_task("plan the move")
        .with_workspace_files(vec![WorkspaceFile {
            path: "NOTES.md".into(),
            content: "boxes in the garage ".repeat(20),
        }])
        .with_memory(vec![MemorySnippet::new(
            "moving on the 3rd",
            Provenance::Observed,
            0.3,
        )])
}

#[tokio::test]
async fn budget_drops_highest_priority_number_first() {
    let (roomy, _, _) = orchestrator(budget_table(100_000));
    let (_, full) = roomy.build(&budget_ctx()).await.unwrap();
    assert!(!full.over_budget);

    let (tight, _, _) = orchestrator(budget_table(full.tokens_used - 1));
    let (_, report) = tight.build(&budget_ctx()).await.unwrap();

    let memory = report.section(SectionId::MemoryRecall).unwrap();
    assert!(!memory.is_included());
    assert!(memory.gating_reason().unwrap().contains("token budget"));
    assert!(report.section(SectionId::WorkspaceBootstrap).unwrap().is_included());
    assert!(report.tokens_used <= report.token_budget);
    assert!(!report.over_budget);
}

#[tokio::test]
async fn required_sections_over_budget_are_flagged_not_dropped() {
    let (orch, _, _) = orchestrator(budget_table(10));
    let (artifact, report) = orch.build(&budget_ctx()).await.unwrap();

    assert!(report.over_budget);
    assert!(report.tokens_used > report.token_budget);
    assert!(!report.section(SectionId::WorkspaceBootstrap).unwrap().is_included());
    assert!(!report.section(SectionId::MemoryRecall).unwrap().is_included());
    assert!(report.section(SectionId::TaskContext).unwrap().is_included());
    assert_eq!(artifact.total_tokens(), report.tokens_used);
}

#[tokio::test]
async fn concurrent_builds_all_persist() {
    let (orch, store, _) = builtin();
    let orch = Arc::new(orch);

    let mut handles = Vec::new();
    for i in 0..16 {
        let orch = orch.clone();
        handles.push(tokio::spawn(async move {
            let ctx = Context::new(Purpose::Summarization, format!("s-{i}"), "u")
                .with_transcript(format!("message {i}"));
            orch.build(&ctx).await.map(|(_, report)| report.prompt_id)
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(store.count().await.unwrap(), 16);
}
