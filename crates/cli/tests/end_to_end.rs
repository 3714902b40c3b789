//! End-to-end: config file → runtime → build, invoke and pipeline stages →
//! reports on disk.

use async_trait::async_trait;
use promptward_config::AppConfig;
use promptward_core::{
    Context, GatewayError, Message, Provider, ProviderError, ProviderRequest, ProviderResponse, Purpose,
};
use promptward_pipeline::{IntentAction, IntentExtractor, StageRunner};
use promptward_server::Runtime;
use std::sync::Arc;

struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let reply = if request.messages.iter().any(|m| m.content.contains("\"candidates\"")) {
            r#"{"candidates": [{"action": "schedule", "confidence": 0.9, "evidence": ["dentist on friday"]}]}"#
                .to_string()
        } else {
            format!("{} messages received", request.messages.len())
        };
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: request.model,
            metadata: serde_json::Map::new(),
        })
    }
}

fn config_in(dir: &std::path::Path) -> AppConfig {
    let toml = format!(
        r#"
default_model = "echo-1"

[store]
backend = "jsonl"
path = "{}"

[[policies]]
purpose = "summarization"
required = ["identity", "purpose-contract", "task-context"]
token_budget = 800
"#,
        dir.join("reports.jsonl").display()
    );
    AppConfig::from_toml_str(&toml).unwrap()
}

async fn runtime(config: AppConfig) -> Runtime {
    let store = promptward_store::open(&config.store.backend, &config.store.resolved_path())
        .await
        .unwrap();
    Runtime::new(config, store, Arc::new(EchoProvider)).unwrap()
}

#[tokio::test]
async fn reports_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let first_id = {
        let rt = runtime(config.clone()).await;
        let ctx = Context::new(Purpose::Summarization, "s-1", "u-1").with_task("summarize the call");
        let (artifact, report) = rt.orchestrator().build(&ctx).await.unwrap();
        assert_eq!(report.policy_version, 2);
        assert_eq!(report.token_budget, 800);

        let response = rt
            .gateway()
            .invoke(&artifact, "SUMMARIZER", &rt.invoke_settings(None))
            .await
            .unwrap();
        assert_eq!(response.model, "echo-1");
        report.prompt_id
    };

    let rt = runtime(config).await;
    let store = rt.orchestrator().store();
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(store.find_by_prompt_id(&first_id).await.unwrap().is_some());
}

#[tokio::test]
async fn pipeline_runs_on_the_configured_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(config_in(dir.path())).await;
    let runner = StageRunner::new(
        rt.orchestrator().clone(),
        rt.gateway().clone(),
        rt.invoke_settings(None),
    );

    let ctx = Context::new(Purpose::Execution, "s-2", "u-2").with_transcript("book the dentist on Friday please");
    let intent = IntentExtractor::new(runner).extract(&ctx).await.unwrap();
    assert_eq!(intent.best().unwrap().action, IntentAction::Schedule);
    assert_eq!(intent.best().unwrap().evidence, vec!["dentist on friday"]);
    assert_eq!(rt.gateway().model_calls(), 1);
}

#[tokio::test]
async fn executor_prompt_cannot_go_through_the_summarizer() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(config_in(dir.path())).await;
    let ctx = Context::new(Purpose::Execution, "s-3", "u-3").with_task("wire money");
    let (artifact, _) = rt.orchestrator().build(&ctx).await.unwrap();

    let err = rt
        .gateway()
        .invoke(&artifact, "SUMMARIZER", &rt.invoke_settings(None))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::PurposeNotAllowed { .. }));
    assert_eq!(rt.compliance_log().bypass_attempts(), 1);
    assert_eq!(rt.gateway().model_calls(), 0);
}
