// Google Perspective API toxicity provider.
//
// Perspective scores text for toxicity plus a handful of sub-attributes.
// The free tier is limited to ~1 QPS, so every call goes through the rate
// limiter. Sub-attribute scores are attached as reading metadata so the
// classifier can explain *why* something was toxic.
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::reading::{SignalKind, SignalReading};
use super::traits::SignalProvider;
use crate::feed::Post;
use crate::output::truncate_chars;

const ENDPOINT: &str = "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

/// Sub-attributes requested alongside TOXICITY, with the metadata name
/// each is stored under.
const SUB_ATTRIBUTES: [(&str, &str); 4] = [
    ("SEVERE_TOXICITY", "severe_toxicity"),
    ("THREAT", "threat"),
    ("INSULT", "insult"),
    ("IDENTITY_ATTACK", "identity_attack"),
];

pub struct PerspectiveProvider {
    client: Client,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl PerspectiveProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            rate_limiter: RateLimiter::new(1.0),
        }
    }
}

#[async_trait]
impl SignalProvider for PerspectiveProvider {
    fn kind(&self) -> SignalKind {
        SignalKind::Toxicity
    }

    async fn produce(&self, post: &Post) -> Result<Option<SignalReading>> {
        let text = post.full_text();
        if text.trim().is_empty() {
            // Perspective rejects empty comments
            return Ok(None);
        }

        self.rate_limiter.acquire().await;

        let mut requested_attributes = HashMap::new();
        requested_attributes.insert("TOXICITY", AttributeConfig {});
        for (name, _) in SUB_ATTRIBUTES {
            requested_attributes.insert(name, AttributeConfig {});
        }

        let request = PerspectiveRequest {
            comment: Comment { text: &text },
            requested_attributes,
            languages: vec!["en"],
        };

        let response = self
            .client
            .post(ENDPOINT)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Perspective API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Perspective API returned {}: {}", status, body);
        }

        let result: PerspectiveResponse = response
            .json()
            .await
            .context("Failed to parse Perspective API response")?;

        Ok(to_reading(&result).inspect(|reading| {
            debug!(
                post_id = post.post_id,
                toxicity = reading.raw_value,
                text_preview = truncate_chars(&text, 50),
                "Scored text"
            );
        }))
    }
}

/// Convert an API response into a toxicity reading. A response without a
/// TOXICITY score yields no reading rather than a fake zero.
fn to_reading(response: &PerspectiveResponse) -> Option<SignalReading> {
    let toxicity = response.attribute_scores.get("TOXICITY")?.summary_score.value;
    let mut reading = SignalReading::toxicity(toxicity);
    for (api_name, name) in SUB_ATTRIBUTES {
        if let Some(score) = response.attribute_scores.get(api_name) {
            reading = reading.with_attribute(name, score.summary_score.value);
        }
    }
    Some(reading)
}

// --- Perspective API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveRequest<'a> {
    comment: Comment<'a>,
    requested_attributes: HashMap<&'static str, AttributeConfig>,
    languages: Vec<&'static str>,
}

#[derive(Serialize)]
struct Comment<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct AttributeConfig {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveResponse {
    attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScore {
    summary_score: SummaryScore,
}

#[derive(Deserialize)]
struct SummaryScore {
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_maps_to_reading_with_attributes() {
        let json = r#"{"attributeScores": {
            "TOXICITY": {"summaryScore": {"value": 0.91}},
            "THREAT": {"summaryScore": {"value": 0.62}}
        }}"#;
        let response: PerspectiveResponse = serde_json::from_str(json).unwrap();
        let reading = to_reading(&response).unwrap();
        assert_eq!(reading.kind, SignalKind::Toxicity);
        assert!((reading.raw_value - 0.91).abs() < f64::EPSILON);
        assert_eq!(reading.metadata.attributes.get("threat"), Some(&0.62));
        assert!(!reading.metadata.attributes.contains_key("insult"));
    }

    #[test]
    fn response_without_toxicity_is_absent() {
        let json = r#"{"attributeScores": {"INSULT": {"summaryScore": {"value": 0.4}}}}"#;
        let response: PerspectiveResponse = serde_json::from_str(json).unwrap();
        assert!(to_reading(&response).is_none());
    }
}
