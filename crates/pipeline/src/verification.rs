//! Verification (call site `L2_VERIFIER`).
//!
//! A second model checks a proposed result and returns a verdict. The
//! verdict vocabulary is closed: anything other than pass, fail or
//! uncertain is a parse error rather than a guess.

use crate::error::PipelineError;
use crate::json::{clamp_unit, parse_reply};
use crate::stage::StageRunner;
use promptward_core::{Context, Purpose};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const SITE: &str = "L2_VERIFIER";

const STAGE: &str = "verification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Uncertain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub prompt_id: String,
    pub verdict: Verdict,
    /// In [0, 1]
    pub confidence: f32,
    pub issues: Vec<String>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

#[derive(Debug, Deserialize)]
struct RawVerification {
    verdict: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    issues: Vec<String>,
}

pub struct Verifier {
    runner: StageRunner,
    site: String,
}

impl Verifier {
    pub fn new(runner: StageRunner) -> Self {
        Self {
            runner,
            site: SITE.to_string(),
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// `ctx.task_description` should carry the result under review.
    pub async fn verify(&self, ctx: &Context) -> Result<Verification, PipelineError> {
        let output = self.runner.run(ctx, Purpose::Verification, &self.site).await?;
        let (verdict, confidence, issues) = parse_verdict(&output.text)?;
        info!(
            prompt_id = %output.prompt_id,
            verdict = ?verdict,
            confidence,
            issues = issues.len(),
            "Verification complete"
        );
        Ok(Verification {
            prompt_id: output.prompt_id,
            verdict,
            confidence,
            issues,
        })
    }
}

/// Parse a verifier reply into `(verdict, confidence, issues)`.
pub fn parse_verdict(reply: &str) -> Result<(Verdict, f32, Vec<String>), PipelineError> {
    let raw: RawVerification = parse_reply(STAGE, reply)?;
    let verdict = match raw.verdict.trim().to_ascii_lowercase().as_str() {
        "pass" => Verdict::Pass,
        "fail" => Verdict::Fail,
        "uncertain" => Verdict::Uncertain,
        other => return Err(PipelineError::parse(STAGE, format!("unknown verdict '{other}'"))),
    };
    let issues = raw
        .issues
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    Ok((verdict, clamp_unit(raw.confidence), issues))
}
