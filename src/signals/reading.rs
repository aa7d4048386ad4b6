// Signal readings — one raw measurement per signal kind for a single post.
//
// Providers hand these to the scoring core. A reading is never mutated after
// it's produced; normalization builds a new NormalizedSignal from it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// The independent content-risk signals the engine knows how to combine.
///
/// Declaration order is the tie-break order for equal contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Probability in [0, 1] that the text is toxic
    Toxicity,
    /// Polarity in [-1, 1]; negative means hostile or upset
    Sentiment,
    /// Number of unsafe-keyword hits
    Keyword,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Toxicity, SignalKind::Sentiment, SignalKind::Keyword];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Toxicity => "toxicity",
            SignalKind::Sentiment => "sentiment",
            SignalKind::Keyword => "keyword",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toxicity" => Ok(SignalKind::Toxicity),
            "sentiment" => Ok(SignalKind::Sentiment),
            "keyword" | "keywords" => Ok(SignalKind::Keyword),
            other => Err(ScoringError::invalid(other, "unknown signal kind")),
        }
    }
}

/// Optional context a provider can attach to its reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    /// Keywords that matched (keyword signal only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
    /// Named sub-scores in [0, 1], e.g. `threat` or `insult` for toxicity
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, f64>,
}

/// A raw, unnormalized measurement from one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub kind: SignalKind,
    /// Probability, polarity or hit count depending on `kind`
    pub raw_value: f64,
    #[serde(default)]
    pub metadata: SignalMetadata,
}

impl SignalReading {
    pub fn new(kind: SignalKind, raw_value: f64) -> Self {
        Self {
            kind,
            raw_value,
            metadata: SignalMetadata::default(),
        }
    }

    pub fn toxicity(probability: f64) -> Self {
        Self::new(SignalKind::Toxicity, probability)
    }

    pub fn sentiment(polarity: f64) -> Self {
        Self::new(SignalKind::Sentiment, polarity)
    }

    pub fn keyword_hits(matched: Vec<String>) -> Self {
        Self {
            kind: SignalKind::Keyword,
            raw_value: matched.len() as f64,
            metadata: SignalMetadata {
                matched_keywords: matched,
                attributes: BTreeMap::new(),
            },
        }
    }

    pub fn with_attribute(mut self, name: &str, score: f64) -> Self {
        self.metadata.attributes.insert(name.to_string(), score);
        self
    }

    /// Parse an untyped ingestion value into a reading.
    ///
    /// Accepts a bare number, a numeric string, or an object
    /// `{"value": n, "attributes": {...}, "matched_keywords": [...]}`.
    /// Unknown kinds, non-numeric values and NaN are rejected.
    pub fn from_raw(kind: &str, value: &serde_json::Value) -> Result<Self, ScoringError> {
        let kind: SignalKind = kind.parse()?;

        let (raw, metadata) = match value {
            serde_json::Value::Object(map) => {
                let raw = map
                    .get("value")
                    .ok_or_else(|| ScoringError::invalid(kind.as_str(), "object has no `value` field"))?;
                let metadata = SignalMetadata {
                    matched_keywords: map
                        .get("matched_keywords")
                        .and_then(|v| serde_json::from_value(v.clone()).ok())
                        .unwrap_or_default(),
                    attributes: map
                        .get("attributes")
                        .and_then(|v| serde_json::from_value(v.clone()).ok())
                        .unwrap_or_default(),
                };
                (raw, metadata)
            }
            other => (other, SignalMetadata::default()),
        };

        let raw_value = match raw {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ScoringError::invalid(kind.as_str(), format!("unrepresentable number {n}")))?,
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ScoringError::invalid(kind.as_str(), format!("non-numeric value {s:?}")))?,
            other => {
                return Err(ScoringError::invalid(
                    kind.as_str(),
                    format!("non-numeric value {other}"),
                ))
            }
        };

        if raw_value.is_nan() {
            return Err(ScoringError::invalid(kind.as_str(), "value is NaN"));
        }

        Ok(Self {
            kind,
            raw_value,
            metadata,
        })
    }
}
