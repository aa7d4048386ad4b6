// Signal normalization — every raw reading onto one [0, 1] risk scale.
//
// Risk is monotonic in harm for every kind: higher toxicity, more negative
// sentiment, and more keyword hits all mean higher risk.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::signals::reading::{SignalKind, SignalReading};

/// Tunables for the normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Keyword hit count at which keyword risk saturates at 1.0 (default 3)
    pub keyword_saturation: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            keyword_saturation: 3.0,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !self.keyword_saturation.is_finite() || self.keyword_saturation <= 0.0 {
            return Err(ScoringError::ConfigValidation(format!(
                "keyword_saturation must be a positive number, got {}",
                self.keyword_saturation
            )));
        }
        Ok(())
    }
}

/// How a raw value was mapped to risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Probability used as-is, clamped to [0, 1]
    Clamp,
    /// Polarity p in [-1, 1] mapped to (1 - p) / 2
    InvertedPolarity,
    /// min(1, hits / saturation)
    Saturation,
}

/// A reading mapped onto the common risk scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSignal {
    pub reading: SignalReading,
    /// Risk in [0, 1], where 1 is maximal harm
    pub risk: f64,
    pub method: NormalizationMethod,
}

impl NormalizedSignal {
    pub fn kind(&self) -> SignalKind {
        self.reading.kind
    }
}

/// Normalize one raw reading. Pure; fails only on malformed values.
pub fn normalize(
    reading: &SignalReading,
    config: &NormalizerConfig,
) -> Result<NormalizedSignal, ScoringError> {
    let raw = reading.raw_value;
    if raw.is_nan() {
        return Err(ScoringError::invalid(reading.kind.as_str(), "value is NaN"));
    }

    let (risk, method) = match reading.kind {
        SignalKind::Toxicity => (raw.clamp(0.0, 1.0), NormalizationMethod::Clamp),
        SignalKind::Sentiment => {
            let polarity = raw.clamp(-1.0, 1.0);
            ((1.0 - polarity) / 2.0, NormalizationMethod::InvertedPolarity)
        }
        SignalKind::Keyword => {
            if raw < 0.0 {
                return Err(ScoringError::invalid(
                    reading.kind.as_str(),
                    format!("negative hit count {raw}"),
                ));
            }
            (
                (raw / config.keyword_saturation).min(1.0),
                NormalizationMethod::Saturation,
            )
        }
    };

    Ok(NormalizedSignal {
        reading: reading.clone(),
        risk,
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_of(reading: SignalReading) -> f64 {
        normalize(&reading, &NormalizerConfig::default()).unwrap().risk
    }

    #[test]
    fn toxicity_passes_through() {
        assert!((risk_of(SignalReading::toxicity(0.37)) - 0.37).abs() < f64::EPSILON);
    }

    #[test]
    fn toxicity_out_of_range_is_clamped() {
        assert_eq!(risk_of(SignalReading::toxicity(1.4)), 1.0);
        assert_eq!(risk_of(SignalReading::toxicity(-0.2)), 0.0);
    }

    #[test]
    fn sentiment_is_inverted() {
        assert_eq!(risk_of(SignalReading::sentiment(-1.0)), 1.0);
        assert_eq!(risk_of(SignalReading::sentiment(1.0)), 0.0);
        assert_eq!(risk_of(SignalReading::sentiment(0.0)), 0.5);
        // Clamped before mapping
        assert_eq!(risk_of(SignalReading::sentiment(-3.0)), 1.0);
    }

    #[test]
    fn keyword_saturates_at_three_hits() {
        let kw = |n: f64| risk_of(SignalReading::new(SignalKind::Keyword, n));
        assert_eq!(kw(0.0), 0.0);
        assert!((kw(1.0) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(kw(3.0), 1.0);
        assert_eq!(kw(10.0), 1.0);
    }

    #[test]
    fn keyword_saturation_is_configurable() {
        let config = NormalizerConfig {
            keyword_saturation: 2.0,
        };
        let n = normalize(&SignalReading::new(SignalKind::Keyword, 1.0), &config).unwrap();
        assert_eq!(n.risk, 0.5);
        assert_eq!(n.method, NormalizationMethod::Saturation);
    }

    #[test]
    fn nan_is_invalid() {
        let err = normalize(&SignalReading::toxicity(f64::NAN), &NormalizerConfig::default());
        assert!(matches!(err, Err(ScoringError::InvalidSignal { .. })));
    }

    #[test]
    fn negative_keyword_count_is_invalid() {
        let err = normalize(
            &SignalReading::new(SignalKind::Keyword, -1.0),
            &NormalizerConfig::default(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn risk_is_monotonic_in_harm() {
        let mut prev = -1.0;
        for i in 0..=20 {
            // Sentiment from +1 down to -1: harm increases
            let polarity = 1.0 - i as f64 * 0.1;
            let r = risk_of(SignalReading::sentiment(polarity));
            assert!(r >= prev, "risk decreased at polarity {polarity}");
            prev = r;
        }
    }

    #[test]
    fn zero_saturation_fails_validation() {
        let config = NormalizerConfig {
            keyword_saturation: 0.0,
        };
        assert!(config.validate().is_err());
    }
}
