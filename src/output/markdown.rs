// Markdown report — a shareable summary of one moderation run.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::report::ModerationReport;
use crate::scoring::classify::Label;
use crate::signals::reading::SignalKind;

/// Render the report and write it to `path`. `post_text` maps post ids to
/// their text so examples can be quoted; missing ids are shown without text.
pub fn generate_report(
    report: &ModerationReport,
    post_text: &HashMap<String, String>,
    path: &Path,
) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let markdown = render(report, post_text, Utc::now());
    std::fs::write(path, markdown)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Render the report as Markdown.
pub fn render(
    report: &ModerationReport,
    post_text: &HashMap<String, String>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();

    // Writing to a String never fails
    let _ = writeln!(md, "# Content Moderation Report\n");
    let _ = writeln!(md, "Generated {}\n", generated_at.format("%Y-%m-%d %H:%M UTC"));

    let _ = writeln!(md, "## Summary Statistics\n");
    let _ = writeln!(md, "- Total Posts Analyzed: {}", report.total_posts);
    for label in [Label::Unsafe, Label::Neutral, Label::Safe] {
        let s = report.label(label);
        let _ = writeln!(md, "- {} Posts: {} ({:.1}%)", label, s.count, s.percentage);
    }
    if report.unclassifiable > 0 {
        let _ = writeln!(md, "- Unclassifiable Posts: {}", report.unclassifiable);
    }

    let _ = writeln!(md, "\n## Signal Influence\n");
    let _ = writeln!(md, "| Signal | Posts | Avg contribution |");
    let _ = writeln!(md, "|---|---:|---:|");
    for kind in SignalKind::ALL {
        let avg = &report.signal_averages[&kind];
        let _ = writeln!(
            md,
            "| {} | {} | {:.3} |",
            kind, avg.present_in, avg.mean_contribution
        );
    }

    let _ = writeln!(md, "\n## Common Causes for Moderation\n");
    if report.common_reasons.is_empty() {
        let _ = writeln!(md, "None.");
    }
    for rc in &report.common_reasons {
        let _ = writeln!(md, "- {}: {} occurrences", rc.reason, rc.count);
    }

    for label in [Label::Unsafe, Label::Neutral, Label::Safe] {
        let examples = &report.label(label).examples;
        if examples.is_empty() {
            continue;
        }
        let _ = writeln!(md, "\n## Sample {label} Posts");
        for (i, ex) in examples.iter().enumerate() {
            let _ = writeln!(md, "\n### Example {}\n", i + 1);
            let _ = writeln!(md, "- Post ID: {}", ex.post_id);
            if let Some(text) = post_text.get(&ex.post_id) {
                let _ = writeln!(md, "- Content: \"{}\"", super::truncate_chars(text, 280));
            }
            let _ = writeln!(md, "- Composite Score: {:.3}", ex.composite);
            if let Some(rule) = &ex.override_rule {
                let _ = writeln!(md, "- Override: {}", rule.id);
            }
            let _ = writeln!(md, "- Reason: {}", ex.reasons.join("; "));
        }
    }

    let _ = writeln!(md, "\n## Overall Assessment\n");
    let _ = writeln!(md, "{}", report.overall_assessment());

    md
}
