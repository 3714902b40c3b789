//! Shared build → invoke step for every pipeline stage.

use crate::error::PipelineError;
use promptward_core::{Context, PromptReport, Purpose};
use promptward_engine::Orchestrator;
use promptward_gateway::{InvokeSettings, LlmGateway};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// What one stage call produced before parsing.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub prompt_id: String,
    /// Raw model reply text
    pub text: String,
    pub report: PromptReport,
}

/// Builds a prompt for a purpose and sends it through the gateway.
/// Cheap to clone; stages share one runner.
#[derive(Debug, Clone)]
pub struct StageRunner {
    orchestrator: Arc<Orchestrator>,
    gateway: Arc<LlmGateway>,
    settings: InvokeSettings,
}

impl StageRunner {
    pub fn new(orchestrator: Arc<Orchestrator>, gateway: Arc<LlmGateway>, settings: InvokeSettings) -> Self {
        Self {
            orchestrator,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &InvokeSettings {
        &self.settings
    }

    /// Build for `purpose` (overriding the context's own purpose) and invoke
    /// the model as `site`.
    pub async fn run(&self, ctx: &Context, purpose: Purpose, site: &str) -> Result<StageOutput, PipelineError> {
        let ctx = if ctx.purpose == purpose {
            Cow::Borrowed(ctx)
        } else {
            Cow::Owned(Context {
                purpose,
                ..ctx.clone()
            })
        };

        let (artifact, report) = self.orchestrator.build(&ctx).await?;
        let response = self.gateway.invoke(&artifact, site, &self.settings).await?;

        debug!(
            site,
            purpose = %purpose,
            prompt_id = artifact.prompt_id(),
            reply_chars = response.message.content.len(),
            "Stage reply received"
        );

        Ok(StageOutput {
            prompt_id: artifact.prompt_id().to_string(),
            text: response.message.content,
            report,
        })
    }
}
