// Weighted aggregation of normalized signals into one composite score.
//
// composite = Σ(risk × weight) / Σ(weight) over the signals that are present.
// A missing signal drops out of numerator and denominator alike, so a model
// outage degrades the score to "what the remaining models think" instead of
// quietly reading as zero risk.

use serde::{Deserialize, Serialize};

use super::normalize::NormalizedSignal;
use crate::error::ScoringError;
use crate::signals::reading::SignalKind;

/// Relative weight per signal kind. Need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub toxicity: f64,
    pub sentiment: f64,
    pub keyword: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            toxicity: 0.5,
            sentiment: 0.3,
            keyword: 0.2,
        }
    }
}

impl WeightConfig {
    pub fn weight_for(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Toxicity => self.toxicity,
            SignalKind::Sentiment => self.sentiment,
            SignalKind::Keyword => self.keyword,
        }
    }

    /// Weights must be finite and non-negative, with a positive, finite sum.
    pub fn validate(&self) -> Result<(), ScoringError> {
        for kind in SignalKind::ALL {
            let w = self.weight_for(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(ScoringError::ConfigValidation(format!(
                    "weight for {kind} must be a non-negative number, got {w}"
                )));
            }
        }
        if SignalKind::ALL.iter().all(|k| self.weight_for(*k) == 0.0) {
            return Err(ScoringError::ConfigValidation(
                "at least one signal weight must be greater than zero".to_string(),
            ));
        }
        let total: f64 = SignalKind::ALL.iter().map(|k| self.weight_for(*k)).sum();
        if !total.is_finite() {
            return Err(ScoringError::ConfigValidation(format!(
                "signal weights must have a finite sum, got {total}"
            )));
        }
        Ok(())
    }
}

/// One signal's share of the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub kind: SignalKind,
    pub risk: f64,
    pub weight: f64,
    /// risk × weight
    pub contribution: f64,
}

/// Output of the aggregation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub composite: f64,
    /// Sorted by contribution descending, ties in SignalKind order
    pub contributions: Vec<Contribution>,
}

/// Combine normalized signals under `weights`.
///
/// Fails with `NoSignals` if the input is empty or every present signal has
/// zero weight. A composite of 0 in that case would be indistinguishable
/// from a confirmed-safe post. A composite that is not finite is reported as
/// a configuration error rather than banded.
pub fn aggregate(
    signals: &[NormalizedSignal],
    weights: &WeightConfig,
) -> Result<Aggregate, ScoringError> {
    let mut contributions: Vec<Contribution> = signals
        .iter()
        .map(|s| {
            let weight = weights.weight_for(s.kind());
            Contribution {
                kind: s.kind(),
                risk: s.risk,
                weight,
                contribution: s.risk * weight,
            }
        })
        .collect();

    let total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
    if contributions.is_empty() || total_weight <= 0.0 {
        return Err(ScoringError::NoSignals { post_id: None });
    }

    let weighted_sum: f64 = contributions.iter().map(|c| c.contribution).sum();
    let composite = weighted_sum / total_weight;
    if !composite.is_finite() {
        return Err(ScoringError::ConfigValidation(format!(
            "composite score is not finite ({weighted_sum} / {total_weight})"
        )));
    }
    let composite = composite.clamp(0.0, 1.0);

    contributions.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then_with(|| a.kind.cmp(&b.kind))
    });

    Ok(Aggregate {
        composite,
        contributions,
    })
}
