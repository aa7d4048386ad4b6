// Signal provider trait — the swap-ready abstraction over external models.
//
// Each provider wraps one model (or one column of precomputed output) and
// reports a raw reading for its kind. Returning `Ok(None)` means "could not
// score this post" and is the normal way to opt out; the pipeline treats
// errors and timeouts the same way.

use anyhow::Result;
use async_trait::async_trait;

use super::reading::{SignalKind, SignalReading};
use crate::feed::Post;

/// Trait for producing one kind of signal reading. Implementations must be
/// async because most model backends are HTTP calls.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Which signal kind this provider produces.
    fn kind(&self) -> SignalKind;

    /// Score one post. `Ok(None)` means the provider had nothing to say.
    async fn produce(&self, post: &Post) -> Result<Option<SignalReading>>;
}

/// Provider that never produces a reading. Useful as a placeholder for a
/// model that is configured off.
pub struct AbsentProvider(pub SignalKind);

#[async_trait]
impl SignalProvider for AbsentProvider {
    fn kind(&self) -> SignalKind {
        self.0
    }

    async fn produce(&self, _post: &Post) -> Result<Option<SignalReading>> {
        Ok(None)
    }
}
