// Colored terminal output for moderation reports and single decisions.

use colored::Colorize;

use crate::report::ModerationReport;
use crate::scoring::classify::{ClassificationResult, Label};
use crate::signals::reading::SignalKind;

/// Display a batch report summary.
pub fn display_report(report: &ModerationReport) {
    println!(
        "\n{}",
        format!("=== Moderation Report ({} posts) ===", report.total_posts).bold()
    );
    println!();

    for label in [Label::Unsafe, Label::Neutral, Label::Safe] {
        let s = report.label(label);
        println!(
            "  {:<10} {:>6}  {:>5.1}%",
            colorize_label(label),
            s.count,
            s.percentage
        );
    }
    if report.unclassifiable > 0 {
        println!(
            "  {:<10} {:>6}",
            "Unclassifiable".dimmed(),
            report.unclassifiable
        );
    }

    println!("\n  {}", "Signal influence (avg contribution):".dimmed());
    for kind in SignalKind::ALL {
        let avg = &report.signal_averages[&kind];
        println!(
            "    {:<10} {:.3}  ({} posts)",
            kind.as_str(),
            avg.mean_contribution,
            avg.present_in
        );
    }

    if !report.common_reasons.is_empty() {
        println!("\n  {}", "Common causes:".dimmed());
        for rc in &report.common_reasons {
            println!("    {:>4}  {}", rc.count, rc.reason);
        }
    }

    let unsafe_examples = &report.label(Label::Unsafe).examples;
    if !unsafe_examples.is_empty() {
        println!("\n  {}", "Clearest unsafe posts:".dimmed());
        for (i, ex) in unsafe_examples.iter().enumerate() {
            println!(
                "    {}. {} [{:.2}] {}",
                i + 1,
                ex.post_id,
                ex.composite,
                super::truncate_chars(&ex.reasons.join("; "), 100).dimmed()
            );
        }
    }

    println!("\n  {}", report.overall_assessment());
}

/// Display one post's decision with its evidence trail.
pub fn display_result(result: &ClassificationResult) {
    println!(
        "  {:<12} {:<8} {:.3}",
        result.post_id,
        colorize_label(result.label),
        result.composite
    );
    if let Some(rule) = &result.override_rule {
        println!("    {} {}", "override:".red(), rule.description);
    }
    for c in &result.contributions {
        println!(
            "    {:<10} risk {:.2} × weight {:.2} = {:.3}",
            c.kind.as_str(),
            c.risk,
            c.weight,
            c.contribution
        );
    }
}

/// Colorize a label.
fn colorize_label(label: Label) -> colored::ColoredString {
    match label {
        Label::Unsafe => label.as_str().red().bold(),
        Label::Neutral => label.as_str().yellow(),
        Label::Safe => label.as_str().green(),
    }
}
