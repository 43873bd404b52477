//! CLI entry point for the text analysis pipeline.

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use lex_insight::history::{
    DEFAULT_FILENAME, DEFAULT_ROW_LIMIT, DEFAULT_SEARCH_LIMIT, HistoryStore, InMemoryHistoryStore,
    record_run,
};
use lex_insight::{
    AnalysisConfig, DEFAULT_OPERATIONS, Pipeline, PipelineBuilder, PipelineOutcome,
    WeightedRuleScorer,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[cfg(feature = "remote")]
use lex_insight::language::{GoogleTranslateClient, GoogleTranslateConfig};
#[cfg(feature = "remote")]
use std::env;

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Tabular text analysis: column detection, translation, sentiment and reporting",
    long_about = "Analyse the free-text column of a delimited file and print a short report.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LEX_INSIGHT_TRANSLATE_URL    Override the translation endpoint (--remote-translate)\n\n\
                  EXAMPLES:\n  \
                  # Default operations, offline\n  \
                  lex-insight analyze -i reviews.csv\n\n  \
                  # Pick operations and translate non-English text\n  \
                  lex-insight analyze -i opiniones.csv --op Summarization --op Translation --remote-translate\n\n  \
                  # Search stored rows\n  \
                  lex-insight search delivery"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// History file used by every subcommand
    #[arg(long, default_value = "./outputs/history.json", global = true)]
    history: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a delimited text file
    Analyze(AnalyzeArgs),
    /// Search stored rows by content
    Search {
        /// Text to look for (case-insensitive)
        query: String,
        /// Maximum number of rows to show
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// List past runs, newest first
    History,
    /// List inbox messages, newest first
    Inbox,
    /// Delete all stored rows, messages and runs
    Cleanup,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Path to the file to analyse, or `-` for stdin
    #[arg(short, long)]
    input: String,

    /// Filename recorded in the history (defaults to the input's name)
    #[arg(long)]
    filename: Option<String>,

    /// Report operation to run (repeatable)
    ///
    /// Defaults to Summarization, Sentiment Analysis, Keyword Extraction
    /// and Translation.
    #[arg(long = "op")]
    operations: Vec<String>,

    /// Use the remote service for language detection and translation
    #[arg(long)]
    remote_translate: bool,

    /// Score with weighted keyword rules instead of the lexicon
    #[arg(long)]
    weighted_rules: bool,

    /// Never translate, even when the text is not English
    #[arg(long)]
    no_translate: bool,

    /// Number of concurrent translation calls
    #[arg(long, default_value = "10")]
    translation_workers: usize,

    /// Number of concurrent scoring workers
    #[arg(long, default_value = "15")]
    scoring_workers: usize,

    /// Average score below which the run raises an alert
    #[arg(long, default_value = "-0.3", allow_hyphen_values = true)]
    alert_threshold: f64,

    /// Do not record the run in the history file
    #[arg(long)]
    no_history: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON outcome.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_output = matches!(&cli.command, Command::Analyze(args) if args.json);
    init_logging(&cli.log_level, cli.quiet, json_output);

    dotenv().ok();

    let store = InMemoryHistoryStore::load(&cli.history)?;

    match &cli.command {
        Command::Analyze(args) => run_analyze(args, cli.quiet, &store, &cli.history),
        Command::Search { query, limit } => {
            let rows = store.search(query, *limit)?;
            if rows.is_empty() {
                println!("No rows match '{}'", query);
            }
            for row in rows {
                println!("[{}] score {:>3}  {}", row.timestamp, row.score, row.content);
            }
            Ok(())
        }
        Command::History => {
            for record in store.activity()? {
                println!(
                    "{:<4} {:<25} {:<10} {:>6} rows {:>8.3}s  {}",
                    record.id,
                    truncate_str(&record.filename, 24),
                    record.status,
                    record.records_count,
                    record.processing_time,
                    record.operations
                );
            }
            Ok(())
        }
        Command::Inbox => {
            for message in store.inbox()? {
                println!("[{}] {}: {}", message.timestamp, message.title, message.message);
            }
            Ok(())
        }
        Command::Cleanup => {
            store.clear()?;
            store.save(&cli.history)?;
            println!("History cleared");
            Ok(())
        }
    }
}

fn run_analyze(
    args: &AnalyzeArgs,
    quiet: bool,
    store: &InMemoryHistoryStore,
    history_path: &Path,
) -> Result<()> {
    let raw = if args.input == "-" {
        info!("Reading input from stdin");
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        if !Path::new(&args.input).exists() {
            return Err(anyhow!("Input file not found: {}", args.input));
        }
        info!("Loading file from: {}", args.input);
        std::fs::read_to_string(&args.input)?
    };

    let operations: Vec<String> = if args.operations.is_empty() {
        DEFAULT_OPERATIONS.iter().map(|op| op.to_string()).collect()
    } else {
        args.operations.clone()
    };

    let config = AnalysisConfig::builder()
        .enable_translation(!args.no_translate)
        .translation_workers(args.translation_workers)
        .scoring_workers(args.scoring_workers)
        .alert_threshold(args.alert_threshold)
        .build()?;

    let pipeline = build_pipeline(args, config, quiet || args.json)?;
    let outcome = pipeline.run(&raw, &operations);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.is_success() {
        error!("Analysis failed");
        return Err(anyhow!("Analysis failed"));
    }

    if !args.no_history {
        let filename = match &args.filename {
            Some(name) => name.as_str(),
            None if args.input == "-" => DEFAULT_FILENAME,
            None => Path::new(&args.input)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(DEFAULT_FILENAME),
        };
        record_run(store, &outcome, filename, &operations, DEFAULT_ROW_LIMIT)?;
        store.save(history_path)?;
    }

    Ok(())
}

fn build_pipeline(args: &AnalyzeArgs, config: AnalysisConfig, silent: bool) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if args.weighted_rules {
        builder = builder.scorer(Arc::new(WeightedRuleScorer::default()));
    }

    if args.remote_translate {
        builder = with_remote(builder)?;
    }

    if !silent {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

#[cfg(feature = "remote")]
fn with_remote(builder: PipelineBuilder) -> Result<PipelineBuilder> {
    let mut config = GoogleTranslateConfig::builder();
    if let Ok(url) = env::var("LEX_INSIGHT_TRANSLATE_URL") {
        info!("Using translation endpoint {}", url);
        config = config.base_url(url);
    }
    let client = Arc::new(GoogleTranslateClient::with_config(config.build())?);
    info!("Running with remote language detection and translation");
    Ok(builder.language_detector(client.clone()).translator(client))
}

#[cfg(not(feature = "remote"))]
fn with_remote(builder: PipelineBuilder) -> Result<PipelineBuilder> {
    warn!("Remote translation not compiled in. Using offline detection only.");
    warn!("Compile with --features remote to enable it.");
    Ok(builder)
}

/// Print the report and stats for a human reader.
fn print_outcome(outcome: &PipelineOutcome) {
    println!("\n{}", "=".repeat(80));
    println!("ANALYSIS REPORT");
    println!("{}", "=".repeat(80));

    for section in outcome.report.iter() {
        println!("\n{}", section.title);
        println!("{}", "-".repeat(40));
        println!("{}", section.output);
    }

    if let Some(stats) = &outcome.stats {
        println!("\n{}", "-".repeat(40));
        println!("  Rows: {}", stats.total_rows);
        println!("  Chunks: {}", stats.total_chunks);
        println!("  Processing time: {:.3}s", stats.processing_time);
        println!("  Average score: {:.2}", stats.avg_score);
        if stats.alert {
            warn!("Average sentiment is below the alert threshold");
            println!("  ALERT: average sentiment below threshold");
        }
    }

    if let Some(details) = &outcome.details {
        println!(
            "  Column: {} (language: {}, delimiter: {:?})",
            details.working_column, details.language.code, details.delimiter
        );
    }
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
