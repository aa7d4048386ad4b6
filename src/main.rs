use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use ember::config::{Config, ScoringConfig, ToxicityBackend};
use ember::pipeline::batch::{self, BatchOutcome};
use ember::scoring::engine::ModerationEngine;
use ember::signals::feed::FeedSignalProvider;
use ember::signals::keywords::KeywordMatcher;
use ember::signals::perspective::PerspectiveProvider;
use ember::signals::reading::SignalKind;
use ember::signals::traits::{AbsentProvider, SignalProvider};

/// Ember: multi-signal content moderation for social feeds.
///
/// Combines toxicity, sentiment, and keyword signals into an explainable
/// Safe / Neutral / Unsafe label per post, then summarizes the batch.
#[derive(Parser)]
#[command(name = "ember", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every post in a feed file and write a moderation report
    Classify {
        /// JSON feed file (array of posts)
        feed: PathBuf,

        /// Scoring config file (overrides EMBER_SCORING_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Example posts per label in the report
        #[arg(long)]
        top_n: Option<usize>,

        /// Number of posts to classify in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Output directory (overrides EMBER_OUTPUT_DIR)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print every post's decision and contributions
        #[arg(long)]
        verbose: bool,
    },

    /// Rebuild a report from a saved moderated_feed.json
    Report {
        /// Results file written by `ember classify`
        results: PathBuf,

        /// Example posts per label (defaults to the scoring config's top_n)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Validate a scoring config and print the effective settings
    CheckConfig {
        /// Config file to check (defaults to EMBER_SCORING_CONFIG, then built-in defaults)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ember=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            feed,
            config: config_path,
            top_n,
            concurrency,
            output,
            verbose,
        } => {
            let config = Config::load()?;
            config.require_toxicity()?;

            let scoring =
                ScoringConfig::load(config_path.as_deref().or(config.scoring_config_path.as_deref()))?
                    .with_top_n(top_n);
            let engine = ModerationEngine::new(scoring)?;
            let providers = create_providers(&config, engine.config())?;

            let posts = ember::feed::load_posts(&feed)?;
            println!("Classifying {} posts...", posts.len());

            let outcome = batch::run(
                &posts,
                &providers,
                &engine,
                concurrency,
                config.signal_timeout,
                true,
            )
            .await;

            if verbose {
                println!();
                for result in &outcome.results {
                    ember::output::terminal::display_result(result);
                }
            }

            let report = outcome.report(engine.config().top_n);
            ember::output::terminal::display_report(&report);

            let output_dir = output.unwrap_or(config.output_dir);
            let texts: HashMap<String, String> =
                posts.into_iter().map(|p| (p.post_id, p.text)).collect();
            write_outputs(&output_dir, &outcome, &report, &texts)?;
        }

        Commands::Report { results, top_n } => {
            let config = Config::load()?;
            let top_n = ScoringConfig::load(config.scoring_config_path.as_deref())?
                .with_top_n(top_n)
                .top_n;
            let raw = std::fs::read_to_string(&results)
                .with_context(|| format!("Failed to read {}", results.display()))?;
            let outcome: BatchOutcome = serde_json::from_str(&raw)
                .with_context(|| format!("Malformed results file {}", results.display()))?;
            info!(results = outcome.results.len(), "Rebuilding report");

            let report = outcome.report(top_n);
            ember::output::terminal::display_report(&report);
        }

        Commands::CheckConfig { path } => {
            let config = Config::load()?;
            let path = path.or(config.scoring_config_path);
            let scoring = ScoringConfig::load(path.as_deref())?;

            match &path {
                Some(p) => println!("{} {}", "Config OK:".green().bold(), p.display()),
                None => println!("{} built-in defaults", "Config OK:".green().bold()),
            }
            println!("{}", serde_json::to_string_pretty(&scoring)?);
        }
    }

    Ok(())
}

/// Build one provider per signal kind from the configured backends.
fn create_providers(
    config: &Config,
    scoring: &ScoringConfig,
) -> Result<Vec<Box<dyn SignalProvider>>> {
    let toxicity: Box<dyn SignalProvider> = match config.toxicity_backend {
        ToxicityBackend::Feed => Box::new(FeedSignalProvider::new(SignalKind::Toxicity)),
        ToxicityBackend::Perspective => {
            info!("Using Perspective API for toxicity");
            Box::new(PerspectiveProvider::new(config.perspective_api_key.clone()))
        }
        ToxicityBackend::Off => {
            info!("Toxicity signal disabled");
            Box::new(AbsentProvider(SignalKind::Toxicity))
        }
    };

    Ok(vec![
        toxicity,
        Box::new(FeedSignalProvider::new(SignalKind::Sentiment)),
        Box::new(KeywordMatcher::new(&scoring.keywords)?),
    ])
}

/// Write the moderated feed, JSON summary, and Markdown report.
fn write_outputs(
    dir: &Path,
    outcome: &BatchOutcome,
    report: &ember::report::ModerationReport,
    texts: &HashMap<String, String>,
) -> Result<()> {
    let results_path = ember::output::write_json(dir, "moderated_feed.json", outcome)?;
    let summary_path = ember::output::write_json(dir, "report_summary.json", report)?;
    let md_path =
        ember::output::markdown::generate_report(report, texts, &dir.join("report_summary.md"))?;

    println!("\n{}", "Outputs written:".bold());
    for path in [results_path, summary_path, md_path] {
        println!("  {}", path.display());
    }
    Ok(())
}
