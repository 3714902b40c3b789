//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `GET  /v1/compliance`         : Compliance report with a fresh rogue-prompt scan
//! - `GET  /v1/reports?limit=N`    : Most recent prompt reports, newest first
//! - `GET  /v1/reports/{prompt_id}`: One prompt report
//! - `POST /v1/prompts`            : Build a prompt from a context, return its report
//! - `POST /v1/invoke`             : Build a prompt and send it through a call site

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::runtime::Runtime;
use promptward_core::{
    Context, EngineError, GatewayError, Message, PromptReport, StoreError, Usage,
};
use promptward_gateway::ComplianceReport;

pub type SharedApiState = Arc<Runtime>;

const DEFAULT_REPORT_LIMIT: usize = 20;
const MAX_REPORT_LIMIT: usize = 500;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/compliance", get(compliance_handler))
        .route("/reports", get(list_reports_handler))
        .route("/reports/{prompt_id}", get(get_report_handler))
        .route("/prompts", post(build_prompt_handler))
        .route("/invoke", post(invoke_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ReportQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct ReportListResponse {
    count: usize,
    reports: Vec<PromptReport>,
}

#[derive(Deserialize)]
struct InvokeRequest {
    /// Call site to invoke under
    site: String,
    context: Context,
    /// Overrides the configured default model
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct InvokeResponse {
    prompt_id: String,
    site: String,
    model: String,
    message: Message,
    #[serde(default)]
    usage: Option<Usage>,
    report: PromptReport,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// An error mapped onto an HTTP status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::InvalidContext(_)
            | EngineError::RequiredSectionEmpty { .. }
            | EngineError::UnknownPurpose(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Persistence(_)
            | EngineError::UnregisteredSection(_)
            | EngineError::DuplicateSection(_)
            | EngineError::MislabelledSection { .. }
            | EngineError::PolicyConflict { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Prompt build failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::UnknownCallSite(_) => StatusCode::NOT_FOUND,
            GatewayError::PurposeNotAllowed { .. } | GatewayError::NotAnArtifact(_) => StatusCode::FORBIDDEN,
            GatewayError::Provider(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Report store query failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn compliance_handler(State(state): State<SharedApiState>) -> Result<Json<ComplianceReport>, ApiError> {
    // The scan walks the filesystem.
    let report = tokio::task::spawn_blocking(move || state.compliance_report(None))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("compliance scan aborted: {e}"),
        })?;
    Ok(Json(report))
}

async fn list_reports_handler(
    State(state): State<SharedApiState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_REPORT_LIMIT).min(MAX_REPORT_LIMIT);
    let reports = state.orchestrator().store().scan_recent(limit).await?;
    Ok(Json(ReportListResponse {
        count: reports.len(),
        reports,
    }))
}

async fn get_report_handler(
    State(state): State<SharedApiState>,
    Path(prompt_id): Path<String>,
) -> Result<Json<PromptReport>, ApiError> {
    state
        .orchestrator()
        .store()
        .find_by_prompt_id(&prompt_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("no report for prompt '{prompt_id}'"),
        })
}

async fn build_prompt_handler(
    State(state): State<SharedApiState>,
    Json(ctx): Json<Context>,
) -> Result<(StatusCode, Json<PromptReport>), ApiError> {
    let (_, report) = state.orchestrator().build(&ctx).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn invoke_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let (artifact, report) = state.orchestrator().build(&payload.context).await?;
    let settings = state.invoke_settings(payload.model.as_deref());
    let response = state.gateway().invoke(&artifact, &payload.site, &settings).await?;

    info!(
        site = %payload.site,
        prompt_id = artifact.prompt_id(),
        model = %response.model,
        "Invoke completed"
    );

    Ok(Json(InvokeResponse {
        prompt_id: artifact.prompt_id().to_string(),
        site: payload.site,
        model: response.model,
        message: response.message,
        usage: response.usage,
        report,
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────
