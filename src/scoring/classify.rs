// Classification — composite score plus override rules to a final label.
//
// Two stages:
// 1. Override rules, in configured order. The first rule whose predicate
//    matches a single normalized signal decides the label outright, so one
//    near-certain signal isn't averaged away by mild readings elsewhere.
// 2. Threshold banding on the composite when no override fired. Bands are
//    inclusive-lower / exclusive-upper, so a score sitting exactly on a
//    boundary lands in the higher-risk band.
//
// Classification is a pure function of its inputs: replaying a stored post
// under a changed config reproduces exactly what that config would decide.

use serde::{Deserialize, Serialize};

use super::aggregate::Contribution;
use super::normalize::NormalizedSignal;
use crate::error::ScoringError;
use crate::signals::reading::SignalKind;

/// Final moderation label for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Safe,
    Neutral,
    Unsafe,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Safe, Label::Neutral, Label::Unsafe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Safe => "Safe",
            Label::Neutral => "Neutral",
            Label::Unsafe => "Unsafe",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Band boundaries over the composite score.
///
/// `[0, neutral_max)` is Safe, `[neutral_max, unsafe_min)` is Neutral,
/// `[unsafe_min, 1]` is Unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub neutral_max: f64,
    pub unsafe_min: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            neutral_max: 0.3,
            unsafe_min: 0.7,
        }
    }
}

impl ThresholdConfig {
    /// Map a composite score to its band.
    pub fn band(&self, composite: f64) -> Label {
        if composite >= self.unsafe_min {
            Label::Unsafe
        } else if composite >= self.neutral_max {
            Label::Neutral
        } else {
            Label::Safe
        }
    }

    /// Midpoint of the Neutral band, used to rank "clearest" neutral posts.
    pub fn neutral_midpoint(&self) -> f64 {
        (self.neutral_max + self.unsafe_min) / 2.0
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.neutral_max) || !in_unit(self.unsafe_min) {
            return Err(ScoringError::ConfigValidation(format!(
                "thresholds must lie in [0, 1], got neutral_max={} unsafe_min={}",
                self.neutral_max, self.unsafe_min
            )));
        }
        if self.neutral_max > self.unsafe_min {
            return Err(ScoringError::ConfigValidation(format!(
                "neutral_max ({}) must not exceed unsafe_min ({})",
                self.neutral_max, self.unsafe_min
            )));
        }
        Ok(())
    }
}

/// Direction of an override predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// risk >= threshold
    AtLeast,
    /// risk <= threshold
    AtMost,
}

/// A predicate on one normalized signal that forces a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub id: String,
    pub description: String,
    pub signal: SignalKind,
    #[serde(default = "default_comparison")]
    pub comparison: Comparison,
    /// Risk threshold in [0, 1]
    pub threshold: f64,
    pub label: Label,
}

fn default_comparison() -> Comparison {
    Comparison::AtLeast
}

impl OverrideRule {
    /// The stock rule: near-certain toxicity is Unsafe no matter what.
    pub fn severe_toxicity() -> Self {
        Self {
            id: "severe-toxicity".to_string(),
            description: "Toxicity risk at or above 0.95 forces Unsafe".to_string(),
            signal: SignalKind::Toxicity,
            comparison: Comparison::AtLeast,
            threshold: 0.95,
            label: Label::Unsafe,
        }
    }

    /// Whether this rule fires for the given signals. A rule about an absent
    /// signal never fires.
    pub fn matches(&self, signals: &[NormalizedSignal]) -> bool {
        signals
            .iter()
            .filter(|s| s.kind() == self.signal)
            .any(|s| match self.comparison {
                Comparison::AtLeast => s.risk >= self.threshold,
                Comparison::AtMost => s.risk <= self.threshold,
            })
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.id.trim().is_empty() {
            return Err(ScoringError::ConfigValidation(
                "override rule id must not be empty".to_string(),
            ));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(ScoringError::ConfigValidation(format!(
                "override rule {} threshold must lie in [0, 1], got {}",
                self.id, self.threshold
            )));
        }
        Ok(())
    }
}

/// The override that decided a label, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredOverride {
    pub id: String,
    pub description: String,
}

/// The decision for one post and the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub post_id: String,
    pub composite: f64,
    pub label: Label,
    /// Sorted by contribution descending
    pub contributions: Vec<Contribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_rule: Option<FiredOverride>,
    /// Human-readable reasons, most specific first
    #[serde(default)]
    pub reasons: Vec<String>,
    /// The bands this post was judged against
    pub thresholds: ThresholdConfig,
}

impl ClassificationResult {
    pub fn contribution_of(&self, kind: SignalKind) -> Option<&Contribution> {
        self.contributions.iter().find(|c| c.kind == kind)
    }
}

/// Decide the label for one post.
pub fn classify(
    post_id: &str,
    composite: f64,
    contributions: Vec<Contribution>,
    signals: &[NormalizedSignal],
    thresholds: &ThresholdConfig,
    overrides: &[OverrideRule],
) -> ClassificationResult {
    let fired = overrides.iter().find(|rule| rule.matches(signals));

    let label = match fired {
        Some(rule) => rule.label,
        None => thresholds.band(composite),
    };

    let override_rule = fired.map(|rule| FiredOverride {
        id: rule.id.clone(),
        description: rule.description.clone(),
    });

    let reasons = explain(signals, label, override_rule.as_ref());

    ClassificationResult {
        post_id: post_id.to_string(),
        composite,
        label,
        contributions,
        override_rule,
        reasons,
        thresholds: *thresholds,
    }
}

/// Toxicity risk above which the post is called out as highly toxic.
/// Keyword reasons carry the matched words in parentheses after this text.
pub const KEYWORD_REASON: &str = "Unsafe keywords detected";

const HIGH_TOXICITY: f64 = 0.7;
/// Sub-attribute score above which the attribute is called out.
const ATTRIBUTE_FLAG: f64 = 0.5;
/// Sentiment risk above this means polarity below -0.5.
const HIGHLY_NEGATIVE_RISK: f64 = 0.75;

const ATTRIBUTE_REASONS: [(&str, &str); 4] = [
    ("severe_toxicity", "Severe toxicity detected"),
    ("threat", "Threatening content detected"),
    ("insult", "Insulting content detected"),
    ("identity_attack", "Identity-based attack detected"),
];

/// Build the moderator-facing reason list for a decision.
fn explain(
    signals: &[NormalizedSignal],
    label: Label,
    fired: Option<&FiredOverride>,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(rule) = fired {
        reasons.push(rule.description.clone());
    }

    for signal in signals {
        match signal.kind() {
            SignalKind::Toxicity => {
                if signal.risk > HIGH_TOXICITY {
                    reasons.push("High toxicity detected".to_string());
                }
                for (attr, reason) in ATTRIBUTE_REASONS {
                    if signal
                        .reading
                        .metadata
                        .attributes
                        .get(attr)
                        .is_some_and(|v| *v > ATTRIBUTE_FLAG)
                    {
                        reasons.push(reason.to_string());
                    }
                }
            }
            SignalKind::Keyword => {
                if signal.reading.raw_value > 0.0 {
                    let matched = &signal.reading.metadata.matched_keywords;
                    if matched.is_empty() {
                        reasons.push(KEYWORD_REASON.to_string());
                    } else {
                        reasons.push(format!("{KEYWORD_REASON} ({})", matched.join(", ")));
                    }
                }
            }
            SignalKind::Sentiment => {
                if signal.risk > HIGHLY_NEGATIVE_RISK {
                    reasons.push("Highly negative sentiment".to_string());
                }
            }
        }
    }

    if reasons.is_empty() {
        let fallback = match label {
            Label::Neutral => "Borderline content",
            _ => "No issues detected",
        };
        reasons.push(fallback.to_string());
    }

    reasons
}
