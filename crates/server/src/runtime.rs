//! Runtime wiring: everything a process needs, built once from config.
//!
//! The orchestrator and gateway share one seal key and one compliance log.
//! Both the HTTP server and the CLI go through [`Runtime`].

use promptward_config::{AppConfig, ConfigError};
use promptward_core::{EngineError, Provider, ReportStore, StoreError};
use promptward_engine::{Orchestrator, PolicyTable, PurposePolicy, default_registry};
use promptward_gateway::{CallSite, CallSiteRegistry, ComplianceReport, InvokeSettings, LlmGateway};
use promptward_security::{ComplianceLog, RogueScanner, ScanOutcome, SealError, SealKey, TracingSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Seal(#[from] SealError),
}

pub struct Runtime {
    config: AppConfig,
    orchestrator: Arc<Orchestrator>,
    gateway: Arc<LlmGateway>,
    compliance: Arc<ComplianceLog>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("orchestrator", &self.orchestrator)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl Runtime {
    /// Validate `config`, open the configured report store and build the
    /// default provider.
    pub async fn from_config(config: AppConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let store = promptward_store::open(&config.store.backend, &config.store.resolved_path()).await?;
        let provider = promptward_providers::build_from_config(&config)
            .default_provider()
            .ok_or_else(|| {
                ConfigError::ValidationError(format!("no provider named '{}'", config.default_provider))
            })?;
        Self::new(config, store, provider)
    }

    /// Assemble a runtime from already-built parts.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ReportStore>,
        provider: Arc<dyn Provider>,
    ) -> Result<Self, RuntimeError> {
        let seal = SealKey::from_config(config.seal.key_hex.as_deref())?;
        if config.seal.key_hex.is_none() {
            info!("No seal key configured; using a per-process key");
        }
        let compliance = Arc::new(ComplianceLog::with_sinks(vec![Box::new(TracingSink)]));

        let orchestrator = Orchestrator::new(
            default_registry(),
            policy_table(&config)?,
            store.clone(),
            seal.clone(),
            compliance.clone(),
        )?;
        let gateway = LlmGateway::new(provider.clone(), call_site_registry(&config), seal, compliance.clone());

        info!(
            store = store.name(),
            provider = provider.name(),
            call_sites = gateway.call_sites().len(),
            policy_version = orchestrator.policies().snapshot().version(),
            "Runtime ready"
        );

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
            gateway: Arc::new(gateway),
            compliance,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn gateway(&self) -> &Arc<LlmGateway> {
        &self.gateway
    }

    pub fn compliance_log(&self) -> &Arc<ComplianceLog> {
        &self.compliance
    }

    /// Settings for a gateway call, from the config defaults.
    pub fn invoke_settings(&self, model: Option<&str>) -> InvokeSettings {
        InvokeSettings::new(model.unwrap_or(&self.config.default_model))
            .with_temperature(self.config.default_temperature)
            .with_max_tokens(self.config.default_max_tokens)
            .with_timeout(self.config.request_timeout())
    }

    /// Run the rogue-prompt scan over `root`, or the configured scan root.
    /// With neither set, or on an unreadable tree, the scan is `NotRun`.
    pub fn rogue_scan(&self, root: Option<&Path>) -> ScanOutcome {
        let root: Option<PathBuf> = root
            .map(Path::to_path_buf)
            .or_else(|| self.config.compliance.scan_root.as_ref().map(PathBuf::from));
        let Some(root) = root else {
            return ScanOutcome::NotRun;
        };
        rogue_scan_at(&root, &self.config.compliance.allowed_paths)
    }

    pub fn compliance_report(&self, root: Option<&Path>) -> ComplianceReport {
        self.gateway.compliance_report(self.rogue_scan(root))
    }
}

/// Scan `root` with the given allow-list.
pub fn rogue_scan_at(root: &Path, allowed_paths: &[String]) -> ScanOutcome {
    match RogueScanner::new(allowed_paths.to_vec()).scan_dir(root) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Rogue-prompt scan failed");
            ScanOutcome::NotRun
        }
    }
}

/// The built-in policy table with `[[policies]]` overrides applied on top.
/// Without overrides the table stays at version 1.
pub fn policy_table(config: &AppConfig) -> Result<PolicyTable, EngineError> {
    let builtin = PolicyTable::builtin(config.engine.required_empty);
    if config.policies.is_empty() {
        return Ok(builtin);
    }
    let overrides = config.policies.iter().map(|p| {
        PurposePolicy::new(p.purpose, p.token_budget)
            .require(p.required.iter().copied())
            .allow_optional(p.optional.iter().copied())
            .ban(p.banned.iter().copied())
            .allow_tools(p.allowed_tools.iter().cloned())
            .on_required_empty(p.required_empty.unwrap_or(config.engine.required_empty))
    });
    builtin.with_overrides(overrides)
}

/// The built-in call sites with `[[call_sites]]` merged over them by id.
pub fn call_site_registry(config: &AppConfig) -> CallSiteRegistry {
    CallSiteRegistry::builtin().with_overrides(
        config
            .call_sites
            .iter()
            .map(|s| CallSite::new(s.id.clone(), s.purposes.iter().copied(), s.owner.clone())),
    )
}
