use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::scoring::aggregate::WeightConfig;
use crate::scoring::classify::{OverrideRule, ThresholdConfig};
use crate::scoring::normalize::NormalizerConfig;

/// Where the toxicity signal comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ToxicityBackend {
    /// Precomputed values in the feed file (default)
    Feed,
    /// Google Perspective API — requires PERSPECTIVE_API_KEY, 1 QPS limit
    Perspective,
    /// No toxicity signal at all; the other signals carry the score
    Off,
}

impl FromStr for ToxicityBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "feed" => Ok(ToxicityBackend::Feed),
            "perspective" => Ok(ToxicityBackend::Perspective),
            "off" => Ok(ToxicityBackend::Off),
            other => anyhow::bail!(
                "EMBER_TOXICITY must be one of feed, perspective, off; got {other:?}"
            ),
        }
    }
}

/// Runtime configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Path to a JSON scoring config (EMBER_SCORING_CONFIG). Defaults apply when unset.
    pub scoring_config_path: Option<PathBuf>,
    pub toxicity_backend: ToxicityBackend,
    pub perspective_api_key: String,
    /// How long a single provider may take before its signal counts as missing
    pub signal_timeout: Duration,
    /// Directory for the moderated feed and report files
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables. Nothing here is required;
    /// call the `require_*` checks before operations that need a specific value.
    pub fn load() -> Result<Self> {
        // Unset defaults to precomputed values
        let toxicity_backend = match env::var("EMBER_TOXICITY") {
            Ok(value) => value.parse()?,
            Err(_) => ToxicityBackend::Feed,
        };

        let signal_timeout = match env::var("EMBER_SIGNAL_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .with_context(|| format!("EMBER_SIGNAL_TIMEOUT_MS is not a number: {ms:?}"))?,
            ),
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            scoring_config_path: env::var("EMBER_SCORING_CONFIG").ok().map(PathBuf::from),
            toxicity_backend,
            perspective_api_key: env::var("PERSPECTIVE_API_KEY").unwrap_or_default(),
            signal_timeout,
            output_dir: env::var("EMBER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
        })
    }

    /// Check that the chosen toxicity backend has what it needs.
    pub fn require_toxicity(&self) -> Result<()> {
        if self.toxicity_backend == ToxicityBackend::Perspective
            && self.perspective_api_key.is_empty()
        {
            anyhow::bail!(
                "PERSPECTIVE_API_KEY not set. Add it to your .env file,\n\
                 or set EMBER_TOXICITY=feed to use precomputed toxicity values."
            );
        }
        Ok(())
    }
}

/// Everything that shapes a moderation decision.
///
/// Passed explicitly into the engine so historical decisions can be replayed
/// under a different config. Every field has a default; a JSON file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: WeightConfig,
    pub thresholds: ThresholdConfig,
    pub normalizer: NormalizerConfig,
    /// Evaluated in order; first match wins
    pub overrides: Vec<OverrideRule>,
    /// Example posts per label in reports
    pub top_n: usize,
    /// Unsafe keywords for the keyword matcher
    pub keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: WeightConfig::default(),
            thresholds: ThresholdConfig::default(),
            normalizer: NormalizerConfig::default(),
            overrides: vec![OverrideRule::severe_toxicity()],
            top_n: 5,
            keywords: ["kill", "hate", "nsfw", "violence", "attack", "threat"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ScoringConfig {
    /// Load and validate a config file, or the defaults when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read scoring config {}", path.display()))?;
                serde_json::from_str::<ScoringConfig>(&raw)
                    .with_context(|| format!("Malformed scoring config {}", path.display()))?
            }
            None => ScoringConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply a `--top-n` flag, keeping the configured value when it's absent.
    pub fn with_top_n(mut self, top_n: Option<usize>) -> Self {
        if let Some(n) = top_n {
            self.top_n = n;
        }
        self
    }

    /// Check every invariant up front so per-post scoring never meets a bad config.
    pub fn validate(&self) -> Result<(), ScoringError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.normalizer.validate()?;

        let mut seen = HashSet::new();
        for rule in &self.overrides {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(ScoringError::ConfigValidation(format!(
                    "duplicate override rule id {:?}",
                    rule.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"thresholds": {"unsafe_min": 0.8}, "top_n": 2}"#).unwrap();
        assert_eq!(config.thresholds.neutral_max, 0.3);
        assert_eq!(config.thresholds.unsafe_min, 0.8);
        assert_eq!(config.top_n, 2);
        assert_eq!(config.weights, WeightConfig::default());
        assert_eq!(config.overrides.len(), 1);
    }

    #[test]
    fn override_rules_parse_from_json() {
        let config: ScoringConfig = serde_json::from_str(
            r#"{"overrides": [{
                "id": "slur-list",
                "description": "Any keyword hit is Unsafe",
                "signal": "keyword",
                "threshold": 0.3,
                "label": "Unsafe"
            }]}"#,
        )
        .unwrap();
        assert_eq!(config.overrides[0].id, "slur-list");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_override_ids_rejected() {
        let config = ScoringConfig {
            overrides: vec![OverrideRule::severe_toxicity(), OverrideRule::severe_toxicity()],
            ..ScoringConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"), "got {err}");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ScoringConfig::load(Some(Path::new("/nonexistent/ember.json"))).is_err());
    }

    #[test]
    fn toxicity_backend_names() {
        assert_eq!("feed".parse::<ToxicityBackend>().unwrap(), ToxicityBackend::Feed);
        assert_eq!(
            "perspective".parse::<ToxicityBackend>().unwrap(),
            ToxicityBackend::Perspective
        );
        assert_eq!("off".parse::<ToxicityBackend>().unwrap(), ToxicityBackend::Off);
    }

    #[test]
    fn unknown_toxicity_backend_is_rejected() {
        for bad in ["Perspective", "perspectiv", ""] {
            let err = bad.parse::<ToxicityBackend>().unwrap_err();
            assert!(err.to_string().contains("EMBER_TOXICITY"), "got {err}");
        }
    }

    #[test]
    fn top_n_flag_falls_back_to_config_file() {
        let path = std::env::temp_dir().join(format!("ember-top-n-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"top_n": 2}"#).unwrap();
        let loaded = ScoringConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.clone().with_top_n(None).top_n, 2);
        assert_eq!(loaded.with_top_n(Some(9)).top_n, 9);
    }
}
