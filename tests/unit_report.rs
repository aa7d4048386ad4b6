// Unit tests for the report aggregator.
//
// Tests counts and percentages, example ranking per label, signal averages,
// common reasons, empty batches, and shard merging.

use ember::report::{build_report, ReportAccumulator};
use ember::scoring::aggregate::Contribution;
use ember::scoring::classify::{ClassificationResult, Label, ThresholdConfig};
use ember::signals::reading::SignalKind;

fn result(id: &str, label: Label, composite: f64) -> ClassificationResult {
    ClassificationResult {
        post_id: id.to_string(),
        composite,
        label,
        contributions: vec![],
        override_rule: None,
        reasons: vec![],
        thresholds: ThresholdConfig::default(),
    }
}

fn with_contribution(mut r: ClassificationResult, kind: SignalKind, contribution: f64) -> ClassificationResult {
    r.contributions.push(Contribution {
        kind,
        risk: contribution,
        weight: 1.0,
        contribution,
    });
    r
}

fn ids(examples: &[ClassificationResult]) -> Vec<&str> {
    examples.iter().map(|r| r.post_id.as_str()).collect()
}

// ============================================================
// Counts and percentages
// ============================================================

#[test]
fn counts_and_percentages() {
    let results = [
        result("a", Label::Safe, 0.1),
        result("b", Label::Safe, 0.2),
        result("c", Label::Unsafe, 0.9),
    ];
    let report = build_report(&results, 5);

    assert_eq!(report.label(Label::Safe).count, 2);
    assert_eq!(report.label(Label::Unsafe).count, 1);
    assert_eq!(report.label(Label::Neutral).count, 0);
    assert_eq!(report.label(Label::Safe).percentage, 66.7);
    assert_eq!(report.label(Label::Unsafe).percentage, 33.3);
    assert_eq!(report.label(Label::Neutral).percentage, 0.0);
    assert_eq!(report.total_posts, 3);
    assert_eq!(report.classified, 3);
}

#[test]
fn empty_batch_is_zero_filled() {
    let report = build_report(&[], 5);
    assert_eq!(report.total_posts, 0);
    for label in Label::ALL {
        let s = report.label(label);
        assert_eq!(s.count, 0);
        assert_eq!(s.percentage, 0.0);
        assert!(s.examples.is_empty());
    }
    for kind in SignalKind::ALL {
        assert_eq!(report.signal_averages[&kind].present_in, 0);
        assert_eq!(report.signal_averages[&kind].mean_contribution, 0.0);
    }
    assert!(report.common_reasons.is_empty());
}

#[test]
fn unclassifiable_counts_toward_total_not_percentages() {
    let mut acc = ReportAccumulator::new(5);
    acc.add(&result("a", Label::Unsafe, 0.8));
    acc.add_unclassifiable();
    let report = acc.finish();
    assert_eq!(report.total_posts, 2);
    assert_eq!(report.unclassifiable, 1);
    assert_eq!(report.label(Label::Unsafe).percentage, 100.0);
}

// ============================================================
// Example selection
// ============================================================

#[test]
fn unsafe_examples_highest_first() {
    let results = [
        result("u1", Label::Unsafe, 0.75),
        result("u2", Label::Unsafe, 0.99),
        result("u3", Label::Unsafe, 0.85),
    ];
    let report = build_report(&results, 2);
    assert_eq!(ids(&report.label(Label::Unsafe).examples), vec!["u2", "u3"]);
}

#[test]
fn safe_examples_lowest_first() {
    let results = [
        result("s1", Label::Safe, 0.25),
        result("s2", Label::Safe, 0.01),
        result("s3", Label::Safe, 0.10),
    ];
    let report = build_report(&results, 2);
    assert_eq!(ids(&report.label(Label::Safe).examples), vec!["s2", "s3"]);
}

#[test]
fn neutral_examples_closest_to_band_midpoint() {
    // Default band [0.3, 0.7) has midpoint 0.5
    let results = [
        result("n1", Label::Neutral, 0.31),
        result("n2", Label::Neutral, 0.52),
        result("n3", Label::Neutral, 0.45),
        result("n4", Label::Neutral, 0.66),
    ];
    let report = build_report(&results, 3);
    assert_eq!(ids(&report.label(Label::Neutral).examples), vec!["n2", "n3", "n4"]);
}

#[test]
fn equal_scores_tie_break_on_post_id() {
    let results = [
        result("b", Label::Unsafe, 0.9),
        result("a", Label::Unsafe, 0.9),
    ];
    let report = build_report(&results, 5);
    assert_eq!(ids(&report.label(Label::Unsafe).examples), vec!["a", "b"]);
}

#[test]
fn top_n_zero_keeps_counts_but_no_examples() {
    let report = build_report(&[result("a", Label::Unsafe, 0.9)], 0);
    assert_eq!(report.label(Label::Unsafe).count, 1);
    assert!(report.label(Label::Unsafe).examples.is_empty());
}

// ============================================================
// Signal averages and reasons
// ============================================================

#[test]
fn signal_average_only_counts_posts_where_present() {
    let results = [
        with_contribution(result("a", Label::Safe, 0.1), SignalKind::Toxicity, 0.2),
        with_contribution(result("b", Label::Safe, 0.1), SignalKind::Toxicity, 0.4),
        with_contribution(result("c", Label::Safe, 0.1), SignalKind::Keyword, 0.9),
    ];
    let report = build_report(&results, 5);

    let tox = &report.signal_averages[&SignalKind::Toxicity];
    assert_eq!(tox.present_in, 2);
    assert!((tox.mean_contribution - 0.3).abs() < 1e-12);

    let kw = &report.signal_averages[&SignalKind::Keyword];
    assert_eq!(kw.present_in, 1);
    assert!((kw.mean_contribution - 0.9).abs() < 1e-12);

    assert_eq!(report.signal_averages[&SignalKind::Sentiment].present_in, 0);
}

#[test]
fn common_reasons_skip_safe_posts_and_group_keyword_detail() {
    let mut a = result("a", Label::Unsafe, 0.9);
    a.reasons = vec![
        "High toxicity detected".into(),
        "Unsafe keywords detected (kill)".into(),
    ];
    let mut b = result("b", Label::Neutral, 0.5);
    b.reasons = vec!["Unsafe keywords detected (hate, attack)".into()];
    let mut c = result("c", Label::Safe, 0.1);
    c.reasons = vec!["No issues detected".into()];

    let report = build_report(&[a, b, c], 5);
    assert_eq!(report.common_reasons[0].reason, "Unsafe keywords detected");
    assert_eq!(report.common_reasons[0].count, 2);
    assert_eq!(report.common_reasons[1].reason, "High toxicity detected");
    assert_eq!(report.common_reasons.len(), 2);
    assert_eq!(
        report.overall_assessment(),
        "This feed contains 33.3% unsafe content that requires moderation. \
         The most common issue is Unsafe keywords detected."
    );
}

#[test]
fn parenthesized_override_descriptions_are_not_merged() {
    let mut a = result("a", Label::Unsafe, 0.9);
    a.reasons = vec!["Slur list (strict) matched".into()];
    let mut b = result("b", Label::Unsafe, 0.9);
    b.reasons = vec!["Slur list (lenient) matched".into()];

    let report = build_report(&[a, b], 5);
    let reasons: Vec<&str> = report
        .common_reasons
        .iter()
        .map(|r| r.reason.as_str())
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(reasons.contains(&"Slur list (strict) matched"));
    assert!(reasons.contains(&"Slur list (lenient) matched"));
}

// ============================================================
// Shard merging
// ============================================================

#[test]
fn merged_shards_match_single_pass() {
    let results: Vec<_> = (0..10)
        .map(|i| {
            let composite = i as f64 / 10.0;
            let label = ThresholdConfig::default().band(composite);
            with_contribution(result(&format!("p{i}"), label, composite), SignalKind::Toxicity, composite)
        })
        .collect();

    let single = build_report(&results, 2);

    let mut left = ReportAccumulator::new(2);
    let mut right = ReportAccumulator::new(2);
    for (i, r) in results.iter().enumerate() {
        if i % 2 == 0 {
            left.add(r);
        } else {
            right.add(r);
        }
    }
    let merged_lr = left.clone().merge(right.clone()).finish();
    let merged_rl = right.merge(left).finish();

    for label in Label::ALL {
        assert_eq!(merged_lr.label(label).count, single.label(label).count);
        assert_eq!(
            ids(&merged_lr.label(label).examples),
            ids(&single.label(label).examples)
        );
        assert_eq!(
            ids(&merged_rl.label(label).examples),
            ids(&single.label(label).examples)
        );
    }
    let tox = SignalKind::Toxicity;
    assert!(
        (merged_lr.signal_averages[&tox].mean_contribution
            - single.signal_averages[&tox].mean_contribution)
            .abs()
            < 1e-12
    );
}
