//! LLM gateway: the only code allowed to call a model provider.
//!
//! # Invoke sequence
//!
//! 1. Look up the call site (`UnknownCallSite`).
//! 2. Check the site may request the artifact's purpose (`PurposeNotAllowed`).
//! 3. Verify the artifact's seal (`NotAnArtifact`).
//! 4. Record a `ModelCall` compliance entry.
//! 5. Call the provider with the artifact's messages, bounded by the
//!    configured timeout if any.
//!
//! A failure in steps 1–3 is a bypass attempt: counted, logged, returned.
//! Provider errors are logged and returned unchanged. Nothing is retried.

use crate::call_site::CallSiteRegistry;
use crate::compliance::ComplianceReport;
use promptward_core::{GatewayError, Provider, ProviderError, ProviderRequest, ProviderResponse};
use promptward_engine::PromptArtifact;
use promptward_security::{AuditEvent, AuditOutcome, ComplianceLog, ScanOutcome, SealKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Per-call provider settings.
#[derive(Debug, Clone)]
pub struct InvokeSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Upper bound on the provider call; `None` waits for the provider.
    pub timeout: Option<Duration>,
}

impl InvokeSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            timeout: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct LlmGateway {
    provider: Arc<dyn Provider>,
    sites: CallSiteRegistry,
    seal: SealKey,
    compliance: Arc<ComplianceLog>,
    bypass_attempts: AtomicU64,
    model_calls: AtomicU64,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("provider", &self.provider.name())
            .field("call_sites", &self.sites.len())
            .field("bypass_attempts", &self.bypass_attempts())
            .field("model_calls", &self.model_calls())
            .finish()
    }
}

impl LlmGateway {
    /// `seal` must be the key the orchestrator signs artifacts with.
    pub fn new(
        provider: Arc<dyn Provider>,
        sites: CallSiteRegistry,
        seal: SealKey,
        compliance: Arc<ComplianceLog>,
    ) -> Self {
        Self {
            provider,
            sites,
            seal,
            compliance,
            bypass_attempts: AtomicU64::new(0),
            model_calls: AtomicU64::new(0),
        }
    }

    pub fn call_sites(&self) -> &CallSiteRegistry {
        &self.sites
    }

    pub fn bypass_attempts(&self) -> u64 {
        self.bypass_attempts.load(Ordering::Relaxed)
    }

    /// Calls that passed every check and were sent to the provider.
    pub fn model_calls(&self) -> u64 {
        self.model_calls.load(Ordering::Relaxed)
    }

    pub fn compliance_report(&self, rogue_scan: ScanOutcome) -> ComplianceReport {
        ComplianceReport::new(&self.sites, self.bypass_attempts(), self.model_calls(), rogue_scan)
    }

    /// Send `artifact` to the model on behalf of `site_id`.
    pub async fn invoke(
        &self,
        artifact: &PromptArtifact,
        site_id: &str,
        settings: &InvokeSettings,
    ) -> Result<ProviderResponse, GatewayError> {
        self.authorize(artifact, site_id)
            .inspect_err(|err| self.record_bypass(site_id, artifact, err))?;

        // Logged before the provider call so an aborted call is still on record.
        self.compliance.log(
            AuditEvent::ModelCall {
                site: site_id.to_string(),
                purpose: artifact.purpose(),
            },
            site_id,
            artifact.prompt_id(),
            AuditOutcome::Success,
            Some(format!("model={}", settings.model)),
        );
        self.model_calls.fetch_add(1, Ordering::Relaxed);
        info!(
            site = site_id,
            purpose = %artifact.purpose(),
            prompt_id = artifact.prompt_id(),
            provider = self.provider.name(),
            "Model call"
        );

        let request = ProviderRequest {
            model: settings.model.clone(),
            messages: artifact.messages().to_vec(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stop: Vec::new(),
        };

        let call = self.provider.complete(request);
        let result = match settings.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(format!("no response within {limit:?}")))),
            None => call.await,
        };

        result.map_err(|err| {
            self.compliance.log(
                AuditEvent::ProviderFailure {
                    site: site_id.to_string(),
                },
                site_id,
                artifact.prompt_id(),
                AuditOutcome::Failure,
                Some(err.to_string()),
            );
            warn!(site = site_id, prompt_id = artifact.prompt_id(), error = %err, "Provider call failed");
            GatewayError::Provider(err)
        })
    }

    fn authorize(&self, artifact: &PromptArtifact, site_id: &str) -> Result<(), GatewayError> {
        let site = self
            .sites
            .get(site_id)
            .ok_or_else(|| GatewayError::UnknownCallSite(site_id.to_string()))?;

        if !site.permits(artifact.purpose()) {
            return Err(GatewayError::PurposeNotAllowed {
                site: site_id.to_string(),
                purpose: artifact.purpose(),
            });
        }

        if !artifact.verify_seal(&self.seal) {
            return Err(GatewayError::NotAnArtifact(format!(
                "seal check failed for prompt '{}'",
                artifact.prompt_id()
            )));
        }
        Ok(())
    }

    fn record_bypass(&self, site_id: &str, artifact: &PromptArtifact, err: &GatewayError) {
        self.bypass_attempts.fetch_add(1, Ordering::Relaxed);
        self.compliance.log(
            AuditEvent::BypassAttempt {
                site: site_id.to_string(),
                reason: err.to_string(),
            },
            site_id,
            artifact.prompt_id(),
            AuditOutcome::Denied,
            None,
        );
        warn!(site = site_id, prompt_id = artifact.prompt_id(), error = %err, "Bypass attempt rejected");
    }
}
