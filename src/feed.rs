// Feed ingestion — loading posts from a JSON export.
//
// The feed file is a JSON array of post records. Missing text or hashtags
// are treated as empty strings. Precomputed model outputs (if the export
// has them) ride along in `signals` and are only interpreted later, so a
// malformed value drops one signal instead of rejecting the whole feed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One social-media post as exported by the feed collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hashtags: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub comments: Option<u64>,
    /// Precomputed raw signal values keyed by kind name
    #[serde(default)]
    pub signals: BTreeMap<String, serde_json::Value>,
}

impl Post {
    /// Text and hashtags joined the way the signal models see them.
    pub fn full_text(&self) -> String {
        if self.hashtags.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.text, self.hashtags)
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Load all posts from a JSON feed file.
pub fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed file {}", path.display()))?;
    let posts = parse_posts(&raw).with_context(|| format!("Malformed feed file {}", path.display()))?;
    info!(path = %path.display(), posts = posts.len(), "Loaded feed");
    Ok(posts)
}

/// Parse a JSON array of posts.
pub fn parse_posts(raw: &str) -> Result<Vec<Post>> {
    let posts: Vec<Post> = serde_json::from_str(raw)?;
    Ok(posts)
}
