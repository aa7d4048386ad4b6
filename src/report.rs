// Moderation report — batch-level summary of classification results.
//
// Built by folding results into a ReportAccumulator. The fold is
// order-independent and accumulators merge, so shards classified in
// parallel can each build a partial accumulator and combine at the end.
// An empty batch is a valid input and yields a zero-filled report.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::classify::{ClassificationResult, Label, KEYWORD_REASON};
use crate::signals::reading::SignalKind;

/// How many recurring reasons the report lists.
const COMMON_REASONS_LIMIT: usize = 5;

/// Per-label tally and the clearest examples of that label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub count: usize,
    /// Share of classified posts, rounded to one decimal
    pub percentage: f64,
    /// Up to top_n results, clearest first
    pub examples: Vec<ClassificationResult>,
}

/// Average influence of one signal kind across the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalAverage {
    /// Number of results in which this signal was present
    pub present_in: usize,
    /// Mean risk × weight over those results
    pub mean_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationReport {
    /// Classified plus unclassifiable posts
    pub total_posts: usize,
    pub classified: usize,
    /// Posts with no usable signal
    pub unclassifiable: usize,
    /// Always holds all three labels
    pub labels: BTreeMap<Label, LabelSummary>,
    /// Always holds all three signal kinds
    pub signal_averages: BTreeMap<SignalKind, SignalAverage>,
    /// Most frequent reasons among Neutral and Unsafe posts
    pub common_reasons: Vec<ReasonCount>,
}

impl ModerationReport {
    pub fn label(&self, label: Label) -> &LabelSummary {
        // Every label is inserted by `finish`
        &self.labels[&label]
    }

    /// One-line verdict on the batch for the top of a report.
    pub fn overall_assessment(&self) -> String {
        if self.classified == 0 {
            return "No posts could be classified.".to_string();
        }
        let unsafe_pct = self.label(Label::Unsafe).percentage;
        match self.common_reasons.first() {
            Some(top) => format!(
                "This feed contains {unsafe_pct:.1}% unsafe content that requires moderation. \
                 The most common issue is {}.",
                top.reason
            ),
            None => format!(
                "This feed contains {unsafe_pct:.1}% unsafe content that requires moderation. \
                 No recurring issues were found."
            ),
        }
    }
}

/// Build a report from a finished batch of results.
pub fn build_report(results: &[ClassificationResult], top_n: usize) -> ModerationReport {
    let mut acc = ReportAccumulator::new(top_n);
    for result in results {
        acc.add(result);
    }
    acc.finish()
}

/// Incremental, mergeable report state.
#[derive(Debug, Clone)]
pub struct ReportAccumulator {
    top_n: usize,
    counts: BTreeMap<Label, usize>,
    unclassifiable: usize,
    examples: BTreeMap<Label, Vec<ClassificationResult>>,
    contributions: BTreeMap<SignalKind, (f64, usize)>,
    reasons: BTreeMap<String, usize>,
}

impl ReportAccumulator {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            counts: BTreeMap::new(),
            unclassifiable: 0,
            examples: BTreeMap::new(),
            contributions: BTreeMap::new(),
            reasons: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, result: &ClassificationResult) {
        *self.counts.entry(result.label).or_default() += 1;

        for c in &result.contributions {
            let entry = self.contributions.entry(c.kind).or_default();
            entry.0 += c.contribution;
            entry.1 += 1;
        }

        if result.label != Label::Safe {
            for reason in &result.reasons {
                *self.reasons.entry(reason_key(reason).to_string()).or_default() += 1;
            }
        }

        let examples = self.examples.entry(result.label).or_default();
        examples.push(result.clone());
        rank_and_truncate(result.label, examples, self.top_n);
    }

    pub fn add_unclassifiable(&mut self) {
        self.unclassifiable += 1;
    }

    /// Combine two partial accumulators. Uses the smaller top_n of the two.
    pub fn merge(mut self, other: ReportAccumulator) -> ReportAccumulator {
        self.top_n = self.top_n.min(other.top_n);
        self.unclassifiable += other.unclassifiable;
        for (label, n) in other.counts {
            *self.counts.entry(label).or_default() += n;
        }
        for (kind, (sum, n)) in other.contributions {
            let entry = self.contributions.entry(kind).or_default();
            entry.0 += sum;
            entry.1 += n;
        }
        for (reason, n) in other.reasons {
            *self.reasons.entry(reason).or_default() += n;
        }
        for (label, examples) in other.examples {
            let mine = self.examples.entry(label).or_default();
            mine.extend(examples);
        }
        for (label, examples) in self.examples.iter_mut() {
            rank_and_truncate(*label, examples, self.top_n);
        }
        self
    }

    pub fn finish(mut self) -> ModerationReport {
        let classified: usize = self.counts.values().sum();

        let labels = Label::ALL
            .iter()
            .map(|label| {
                let count = self.counts.get(label).copied().unwrap_or(0);
                let summary = LabelSummary {
                    count,
                    percentage: percentage(count, classified),
                    examples: self.examples.remove(label).unwrap_or_default(),
                };
                (*label, summary)
            })
            .collect();

        let signal_averages = SignalKind::ALL
            .iter()
            .map(|kind| {
                let (sum, n) = self.contributions.get(kind).copied().unwrap_or((0.0, 0));
                let avg = SignalAverage {
                    present_in: n,
                    mean_contribution: if n == 0 { 0.0 } else { sum / n as f64 },
                };
                (*kind, avg)
            })
            .collect();

        let mut common_reasons: Vec<ReasonCount> = self
            .reasons
            .into_iter()
            .map(|(reason, count)| ReasonCount { reason, count })
            .collect();
        common_reasons.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
        common_reasons.truncate(COMMON_REASONS_LIMIT);

        ModerationReport {
            total_posts: classified + self.unclassifiable,
            classified,
            unclassifiable: self.unclassifiable,
            labels,
            signal_averages,
            common_reasons,
        }
    }
}

/// Share of `total`, as a percentage rounded to one decimal. 0 when total is 0.
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Group keyword reasons regardless of which keywords matched. Every other
/// reason, including override descriptions, is its own key.
fn reason_key(reason: &str) -> &str {
    match reason.strip_prefix(KEYWORD_REASON) {
        Some(rest) if rest.is_empty() || rest.starts_with(" (") => KEYWORD_REASON,
        _ => reason,
    }
}

/// Order examples clearest-first and keep at most `top_n`.
///
/// Unsafe: highest composite first. Safe: lowest composite first.
/// Neutral: closest to the middle of the neutral band first.
/// Ties break on post id so the order never depends on arrival order.
fn rank_and_truncate(label: Label, examples: &mut Vec<ClassificationResult>, top_n: usize) {
    examples.sort_by(|a, b| example_order(label, a, b));
    examples.truncate(top_n);
}

fn example_order(label: Label, a: &ClassificationResult, b: &ClassificationResult) -> Ordering {
    let primary = match label {
        Label::Unsafe => b.composite.total_cmp(&a.composite),
        Label::Safe => a.composite.total_cmp(&b.composite),
        Label::Neutral => {
            let da = (a.composite - a.thresholds.neutral_midpoint()).abs();
            let db = (b.composite - b.thresholds.neutral_midpoint()).abs();
            da.total_cmp(&db)
        }
    };
    primary.then_with(|| a.post_id.cmp(&b.post_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(0, 3), 0.0);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn reason_key_strips_detail() {
        assert_eq!(
            reason_key("Unsafe keywords detected (kill, hate)"),
            "Unsafe keywords detected"
        );
        assert_eq!(reason_key("Highly negative sentiment"), "Highly negative sentiment");
    }

    #[test]
    fn override_description_with_parentheses_is_kept_whole() {
        let description = "Severe toxicity (score at least 0.95) forces Unsafe";
        assert_eq!(reason_key(description), description);
    }

    #[test]
    fn empty_report_assessment() {
        let report = build_report(&[], 5);
        assert_eq!(report.overall_assessment(), "No posts could be classified.");
    }
}
