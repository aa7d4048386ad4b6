// Precomputed signals — model outputs exported alongside the feed.
//
// When the feed collector already ran the models, the values ride along in
// each post's `signals` map. This provider just picks out its kind.

use anyhow::Result;
use async_trait::async_trait;

use super::reading::{SignalKind, SignalReading};
use super::traits::SignalProvider;
use crate::feed::Post;

pub struct FeedSignalProvider {
    kind: SignalKind,
}

impl FeedSignalProvider {
    pub fn new(kind: SignalKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl SignalProvider for FeedSignalProvider {
    fn kind(&self) -> SignalKind {
        self.kind
    }

    async fn produce(&self, post: &Post) -> Result<Option<SignalReading>> {
        let value = post
            .signals
            .iter()
            .find(|(name, _)| name.parse::<SignalKind>().ok() == Some(self.kind));

        match value {
            Some((name, serde_json::Value::Null)) => {
                tracing::debug!(post_id = post.post_id, signal = name, "Null precomputed signal");
                Ok(None)
            }
            Some((name, value)) => Ok(Some(SignalReading::from_raw(name, value)?)),
            None => Ok(None),
        }
    }
}
