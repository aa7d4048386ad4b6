// Scoring errors — the three failure kinds the scoring core can report.
//
// Everything else (file I/O, HTTP, CLI parsing) is plumbing and goes through
// anyhow at the application layer.

use thiserror::Error;

/// Errors produced by the normalize → aggregate → classify core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// A raw signal could not be interpreted. Local to one signal: the
    /// caller drops it and keeps scoring the post with what remains.
    #[error("invalid {kind} signal: {reason}")]
    InvalidSignal { kind: String, reason: String },

    /// No usable signal survived for this post. Surfaced as an
    /// "Unclassifiable" outcome, never defaulted to Safe or Unsafe.
    #[error(
        "no usable signals{}",
        .post_id.as_deref().map(|id| format!(" for post {id}")).unwrap_or_default()
    )]
    NoSignals { post_id: Option<String> },

    /// Weights, thresholds or override rules break their invariants.
    /// Only raised while loading configuration.
    #[error("invalid scoring configuration: {0}")]
    ConfigValidation(String),
}

impl ScoringError {
    pub(crate) fn invalid(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoringError::InvalidSignal {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Attach a post id to a NoSignals error raised below the post level.
    pub(crate) fn for_post(self, id: &str) -> Self {
        match self {
            ScoringError::NoSignals { post_id: None } => ScoringError::NoSignals {
                post_id: Some(id.to_string()),
            },
            other => other,
        }
    }
}
