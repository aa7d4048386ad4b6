// Moderation engine — the normalize → aggregate → classify chain for one post.
//
// The engine owns a validated ScoringConfig and nothing else. It holds no
// per-post state, so one instance can be shared across any number of
// concurrent classifications.

use tracing::{debug, warn};

use super::aggregate::aggregate;
use super::classify::{classify, ClassificationResult};
use super::normalize::{normalize, NormalizedSignal};
use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::signals::reading::SignalReading;

#[derive(Debug, Clone)]
pub struct ModerationEngine {
    config: ScoringConfig,
}

impl ModerationEngine {
    /// Build an engine, rejecting a config that breaks its invariants.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Classify one post from whatever readings its providers produced.
    ///
    /// Malformed readings are dropped (logged) and the post is scored with
    /// the rest. Only the first reading of each kind is used. Fails with
    /// `NoSignals` when nothing usable remains.
    pub fn classify_post(
        &self,
        post_id: &str,
        readings: &[SignalReading],
    ) -> Result<ClassificationResult, ScoringError> {
        let mut signals: Vec<NormalizedSignal> = Vec::with_capacity(readings.len());

        for reading in readings {
            if signals.iter().any(|s| s.kind() == reading.kind) {
                warn!(post_id, signal = %reading.kind, "Duplicate signal reading, keeping the first");
                continue;
            }
            match normalize(reading, &self.config.normalizer) {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!(post_id, error = %e, "Dropping invalid signal"),
            }
        }

        let agg = aggregate(&signals, &self.config.weights).map_err(|e| e.for_post(post_id))?;

        let result = classify(
            post_id,
            agg.composite,
            agg.contributions,
            &signals,
            &self.config.thresholds,
            &self.config.overrides,
        );

        debug!(
            post_id,
            composite = format!("{:.3}", result.composite),
            label = result.label.as_str(),
            override_rule = result.override_rule.as_ref().map(|o| o.id.as_str()),
            signals = signals.len(),
            "Classified post"
        );

        Ok(result)
    }
}
