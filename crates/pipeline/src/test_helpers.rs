//! Shared test helpers for stage tests.

use async_trait::async_trait;
use promptward_core::{
    Context, Message, Provider, ProviderError, ProviderRequest, ProviderResponse, Purpose, RequiredEmpty,
};
use promptward_engine::{Orchestrator, PolicyTable, default_registry};
use promptward_gateway::{CallSiteRegistry, InvokeSettings, LlmGateway};
use promptward_security::{ComplianceLog, SealKey};
use promptward_store::InMemoryReportStore;
use std::sync::{Arc, Mutex};

/// Replies with the same text to every call and records each request.
pub struct ScriptedProvider {
    reply: String,
    pub requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: None,
            model,
            metadata: serde_json::Map::new(),
        })
    }
}

pub fn runner(provider: Arc<ScriptedProvider>) -> crate::StageRunner {
    let key = SealKey::generate().unwrap();
    let compliance = Arc::new(ComplianceLog::new());
    let orchestrator = Orchestrator::new(
        default_registry(),
        PolicyTable::builtin(RequiredEmpty::Degrade),
        Arc::new(InMemoryReportStore::new()),
        key.clone(),
        compliance.clone(),
    )
    .unwrap();
    let gateway = LlmGateway::new(provider, CallSiteRegistry::builtin(), key, compliance);
    crate::StageRunner::new(Arc::new(orchestrator), Arc::new(gateway), InvokeSettings::new("test-model"))
}

pub fn context(transcript: &str) -> Context {
    Context::new(Purpose::Execution, "session-1", "user-1").with_transcript(transcript)
}
