//! Intent extraction (call site `L1_SCOUT`).
//!
//! The scout reads the transcript and proposes what the user might want.
//! Candidates are ranked by confidence and capped at three. Evidence quotes
//! are only kept if they actually occur in the transcript; a model that
//! invents a quote loses it.

use crate::error::PipelineError;
use crate::json::{clamp_unit, parse_reply};
use crate::stage::StageRunner;
use promptward_core::{Context, Purpose};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const SITE: &str = "L1_SCOUT";
pub const MAX_CANDIDATES: usize = 3;

const STAGE: &str = "intent";

/// The action families the intent schema offers the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentAction {
    Create,
    Update,
    Delete,
    Query,
    Schedule,
    Communicate,
    Purchase,
    Navigate,
    Other,
}

impl IntentAction {
    /// Case-insensitive; anything unrecognised is `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "query" => Self::Query,
            "schedule" => Self::Schedule,
            "communicate" => Self::Communicate,
            "purchase" => Self::Purchase,
            "navigate" => Self::Navigate,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
            Self::Schedule => "schedule",
            Self::Communicate => "communicate",
            Self::Purchase => "purchase",
            Self::Navigate => "navigate",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCandidate {
    pub action: IntentAction,
    /// In [0, 1]
    pub confidence: f32,
    /// Quotes verified against the transcript
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Quotes the model offered that do not occur in the transcript
    #[serde(default)]
    pub unverified_evidence: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentExtraction {
    pub prompt_id: String,
    /// Highest confidence first
    pub candidates: Vec<IntentCandidate>,
}

impl IntentExtraction {
    pub fn best(&self) -> Option<&IntentCandidate> {
        self.candidates.first()
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    candidates: Vec<RawCandidate>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    action: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

pub struct IntentExtractor {
    runner: StageRunner,
    site: String,
}

impl IntentExtractor {
    pub fn new(runner: StageRunner) -> Self {
        Self {
            runner,
            site: SITE.to_string(),
        }
    }

    /// Invoke under a different call site. The gateway still checks that the
    /// site may request intent extraction.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub async fn extract(&self, ctx: &Context) -> Result<IntentExtraction, PipelineError> {
        let output = self.runner.run(ctx, Purpose::IntentExtraction, &self.site).await?;
        let transcript = ctx.transcript.as_deref().unwrap_or_default();
        let candidates = parse_candidates(&output.text, transcript)?;

        info!(
            prompt_id = %output.prompt_id,
            candidates = candidates.len(),
            best = candidates.first().map(|c| c.action.as_str()).unwrap_or("none"),
            "Intent extracted"
        );
        Ok(IntentExtraction {
            prompt_id: output.prompt_id,
            candidates,
        })
    }
}

/// Parse a scout reply and check its evidence against `transcript`.
pub fn parse_candidates(reply: &str, transcript: &str) -> Result<Vec<IntentCandidate>, PipelineError> {
    let raw: RawIntent = parse_reply(STAGE, reply)?;
    let haystack = normalize(transcript);

    let mut candidates: Vec<IntentCandidate> = raw
        .candidates
        .into_iter()
        .map(|c| {
            let offered = c.evidence.len();
            let evidence: Vec<String> = c
                .evidence
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| quote_occurs(&haystack, q))
                .collect();
            let unverified_evidence = offered - evidence.len();
            if unverified_evidence > 0 {
                debug!(action = %c.action, unverified_evidence, "Dropped evidence not found in transcript");
            }
            IntentCandidate {
                action: IntentAction::parse(&c.action),
                confidence: clamp_unit(c.confidence),
                evidence,
                summary: c.summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                unverified_evidence,
            }
        })
        .collect();

    // Stable: equal confidences keep the model's order.
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.truncate(MAX_CANDIDATES);
    Ok(candidates)
}

/// Lowercase and collapse whitespace so line breaks and casing in the
/// transcript do not defeat an otherwise exact quote.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_occurs(normalized_transcript: &str, quote: &str) -> bool {
    let quote = normalize(quote.trim_matches(|c: char| c == '"' || c == '\'' || c == '“' || c == '”'));
    !quote.is_empty() && normalized_transcript.contains(&quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, context, runner};
    use std::sync::Arc;

    const TRANSCRIPT: &str = "Um, can you book a table for two\nat Luigi's tomorrow at eight?";

    #[test]
    fn candidates_are_ranked_and_capped() {
        let reply = r#"{"candidates": [
            {"action": "query", "confidence": 0.2, "evidence": []},
            {"action": "schedule", "confidence": 0.9, "evidence": ["book a table for two"]},
            {"action": "purchase", "confidence": 0.4, "evidence": []},
            {"action": "communicate", "confidence": 0.6, "evidence": []}
        ]}"#;
        let candidates = parse_candidates(reply, TRANSCRIPT).unwrap();
        let actions: Vec<_> = candidates.iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            vec![IntentAction::Schedule, IntentAction::Communicate, IntentAction::Purchase]
        );
    }

    #[test]
    fn invented_quotes_are_dropped() {
        let reply = r#"{"candidates": [{
            "action": "schedule",
            "confidence": 0.8,
            "evidence": ["Book a table  for two at Luigi's", "for four people"]
        }]}"#;
        let candidates = parse_candidates(reply, TRANSCRIPT).unwrap();
        assert_eq!(candidates[0].evidence, vec!["Book a table  for two at Luigi's"]);
        assert_eq!(candidates[0].unverified_evidence, 1);
    }

    #[test]
    fn confidence_is_clamped() {
        let reply = r#"{"candidates": [
            {"action": "create", "confidence": 3.5},
            {"action": "delete", "confidence": -1}
        ]}"#;
        let candidates = parse_candidates(reply, TRANSCRIPT).unwrap();
        assert_eq!(candidates[0].confidence, 1.0);
        assert_eq!(candidates[1].confidence, 0.0);
    }

    #[test]
    fn unknown_action_falls_back_to_other() {
        assert_eq!(IntentAction::parse("Teleport"), IntentAction::Other);
        assert_eq!(IntentAction::parse(" SCHEDULE "), IntentAction::Schedule);
    }

    #[test]
    fn malformed_reply_is_a_parse_error() {
        let err = parse_candidates("I think they want dinner.", TRANSCRIPT).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { stage: "intent", .. }));
    }

    #[tokio::test]
    async fn extract_calls_the_scout_site() {
        let provider = Arc::new(ScriptedProvider::new(
            "```json\n{\"candidates\": [{\"action\": \"schedule\", \"confidence\": 0.7, \"evidence\": [\"tomorrow at eight\"]}]}\n```",
        ));
        let extractor = IntentExtractor::new(runner(provider.clone()));

        let result = extractor.extract(&context(TRANSCRIPT)).await.unwrap();
        let best = result.best().unwrap();
        assert_eq!(best.action, IntentAction::Schedule);
        assert_eq!(best.evidence, vec!["tomorrow at eight"]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn wrong_site_is_refused_before_the_model() {
        let provider = Arc::new(ScriptedProvider::new("{}"));
        let extractor = IntentExtractor::new(runner(provider.clone())).with_site("L2_VERIFIER");

        let err = extractor.extract(&context(TRANSCRIPT)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Gateway(ref e) if e.is_violation()));
        assert_eq!(provider.call_count(), 0);
    }
}
