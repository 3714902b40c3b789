//! Reading JSON out of model replies.

use crate::error::PipelineError;
use serde::de::DeserializeOwned;

/// Strip a Markdown code fence around a JSON body, if there is one.
/// Text before the opening fence is dropped, as is the info string (`json`).
pub(crate) fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let rest = &trimmed[start + 3..];
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub(crate) fn parse_reply<T: DeserializeOwned>(stage: &'static str, raw: &str) -> Result<T, PipelineError> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(PipelineError::parse(stage, "empty reply"));
    }
    serde_json::from_str(body).map_err(|e| PipelineError::parse(stage, e))
}

/// Clamp a model-reported confidence into [0, 1]. NaN counts as no confidence.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
