// Batch pipeline: classify every post in a feed.
//
// Per post, all providers run concurrently and each gets its own timeout.
// A provider that errors or times out simply contributes no reading; the
// engine scores the post with whatever arrived. Posts themselves are
// processed `concurrency` at a time.

use std::time::Duration;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ScoringError;
use crate::feed::Post;
use crate::report::{ModerationReport, ReportAccumulator};
use crate::scoring::classify::ClassificationResult;
use crate::scoring::engine::ModerationEngine;
use crate::signals::reading::SignalReading;
use crate::signals::traits::SignalProvider;

/// Everything a batch run produced, in feed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<ClassificationResult>,
    /// Ids of posts no provider could score
    pub unclassifiable: Vec<String>,
}

impl BatchOutcome {
    pub fn report(&self, top_n: usize) -> ModerationReport {
        let mut acc = ReportAccumulator::new(top_n);
        for result in &self.results {
            acc.add(result);
        }
        for _ in &self.unclassifiable {
            acc.add_unclassifiable();
        }
        acc.finish()
    }
}

/// Ask every provider about one post. Failures become absent readings.
pub async fn gather_signals(
    post: &Post,
    providers: &[Box<dyn SignalProvider>],
    timeout: Duration,
) -> Vec<SignalReading> {
    let calls = providers.iter().map(|provider| async move {
        match tokio::time::timeout(timeout, provider.produce(post)).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                warn!(
                    post_id = post.post_id,
                    signal = %provider.kind(),
                    error = %e,
                    "Signal provider failed, treating as missing"
                );
                None
            }
            Err(_) => {
                warn!(
                    post_id = post.post_id,
                    signal = %provider.kind(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Signal provider timed out, treating as missing"
                );
                None
            }
        }
    });

    join_all(calls).await.into_iter().flatten().collect()
}

/// Classify a batch of posts.
pub async fn run(
    posts: &[Post],
    providers: &[Box<dyn SignalProvider>],
    engine: &ModerationEngine,
    concurrency: usize,
    timeout: Duration,
    show_progress: bool,
) -> BatchOutcome {
    let pb = if show_progress {
        let pb = ProgressBar::new(posts.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("  Classifying [{bar:30}] {pos}/{len} ({eta})")
        {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    // buffered (not buffer_unordered) keeps results in feed order
    let outcomes: Vec<(usize, Result<ClassificationResult, ScoringError>)> =
        stream::iter(posts.iter().enumerate().map(|(i, post)| {
            let pb = &pb;
            async move {
                let readings = gather_signals(post, providers, timeout).await;
                let outcome = engine.classify_post(&post.post_id, &readings);
                pb.inc(1);
                (i, outcome)
            }
        }))
        .buffered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut batch = BatchOutcome::default();
    for (i, outcome) in outcomes {
        match outcome {
            Ok(result) => batch.results.push(result),
            Err(e) => {
                warn!(post_id = posts[i].post_id, error = %e, "Post is unclassifiable");
                batch.unclassifiable.push(posts[i].post_id.clone());
            }
        }
    }

    info!(
        posts = posts.len(),
        classified = batch.results.len(),
        unclassifiable = batch.unclassifiable.len(),
        "Batch complete"
    );

    batch
}
