//! Dimension extraction (call site `L1_DIMENSIONS`).
//!
//! A dedicated model call reads the transcript and reports the A-set slots
//! and B-set signals it can see in this turn. The caller folds the update
//! into its session's [`DimensionTracker`].

use crate::error::PipelineError;
use crate::json::parse_reply;
use crate::stage::StageRunner;
use promptward_core::{ActionSlots, Context, DimensionTracker, DimensionUpdate, Dimensions, Purpose};
use tracing::info;

pub const SITE: &str = "L1_DIMENSIONS";

const STAGE: &str = "dimension";

pub struct DimensionExtractor {
    runner: StageRunner,
    site: String,
}

impl DimensionExtractor {
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

    /// Run the extraction call and return this turn's update.
    pub async fn extract(&self, ctx: &Context) -> Result<DimensionUpdate, PipelineError> {
        let output = self.runner.run(ctx, Purpose::DimensionExtraction, &self.site).await?;
        let update = parse_update(&output.text)?;
        info!(
            prompt_id = %output.prompt_id,
            filled_slots = update.slots.filled(),
            "Dimensions extracted"
        );
        Ok(update)
    }

    /// Extract and fold into `tracker`; returns the tracker's new snapshot.
    /// A failed call leaves the tracker untouched.
    pub async fn extract_into(
        &self,
        ctx: &Context,
        tracker: &mut DimensionTracker,
    ) -> Result<Dimensions, PipelineError> {
        let update = self.extract(ctx).await?;
        tracker.apply(&update);
        Ok(tracker.snapshot())
    }
}

/// Parse a dimension reply. Missing slots and signals stay absent; range
/// clamping happens when the update is applied.
pub fn parse_update(reply: &str) -> Result<DimensionUpdate, PipelineError> {
    let mut update: DimensionUpdate = parse_reply(STAGE, reply)?;
    // Merging into empty slots trims values and drops blank ones.
    let mut slots = ActionSlots::default();
    slots.merge(&update.slots);
    update.slots = slots;
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, context, runner};
    use std::sync::Arc;

    #[test]
    fn partial_reply_parses() {
        let update = parse_update(r#"{"slots": {"what": "book a table"}, "urgency": 0.6}"#).unwrap();
        assert_eq!(update.slots.what.as_deref(), Some("book a table"));
        assert_eq!(update.urgency, Some(0.6));
        assert_eq!(update.ambiguity, None);
    }

    #[test]
    fn null_signals_count_as_absent() {
        let update = parse_update(r#"{"slots": {}, "urgency": null, "ambiguity": 0.3}"#).unwrap();
        assert_eq!(update.urgency, None);
        assert_eq!(update.ambiguity, Some(0.3));
    }

    #[test]
    fn blank_slots_are_dropped() {
        let update = parse_update(r#"{"slots": {"what": "  ", "who": "Ana"}}"#).unwrap();
        assert_eq!(update.slots.what, None);
        assert_eq!(update.slots.who.as_deref(), Some("Ana"));
    }

    #[test]
    fn non_object_reply_is_a_parse_error() {
        assert!(matches!(
            parse_update("[1, 2, 3]"),
            Err(PipelineError::Parse { stage: "dimension", .. })
        ));
    }

    #[tokio::test]
    async fn updates_fold_into_the_tracker() {
        let provider = Arc::new(ScriptedProvider::new(
            r#"{"slots": {"what": "transfer money", "who": "Ana"}, "urgency": 0.8}"#,
        ));
        let extractor = DimensionExtractor::new(runner(provider.clone()));
        let mut tracker = DimensionTracker::new();

        let first = extractor
            .extract_into(&context("send Ana 20 euros now"), &mut tracker)
            .await
            .unwrap();
        assert_eq!(first.turns, 1);
        assert!((first.signals.urgency - 0.8).abs() < 1e-5);

        let second = extractor
            .extract_into(&context("send Ana 20 euros now"), &mut tracker)
            .await
            .unwrap();
        assert_eq!(second.turns, 2);
        assert!((second.completeness() - 2.0 / 6.0).abs() < 1e-5);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_parse_leaves_tracker_untouched() {
        let provider = Arc::new(ScriptedProvider::new("not json"));
        let extractor = DimensionExtractor::new(runner(provider));
        let mut tracker = DimensionTracker::new();

        assert!(extractor.extract_into(&context("hello"), &mut tracker).await.is_err());
        assert_eq!(tracker.snapshot().turns, 0);
    }
}
