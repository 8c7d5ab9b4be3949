// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case. Results are printed as pretty JSON on stdout; logs
// go through tracing.

pub mod commands;

use std::{fs, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use commands::{Commands, PredictArgs, ReportArgs, TrainArgs};
use feedback_intel::analytics::aggregator::{AnalyticsSummary, TrendPoint};
use feedback_intel::application::{
    analysis_service::AnalysisService,
    analyze_use_case::AnalyzeUseCase,
    train_use_case::TrainUseCase,
};
use feedback_intel::domain::feedback::{FeedbackRecord, IngestReport};
use feedback_intel::infra::memory_store::InMemoryFeedbackStore;

#[derive(Parser, Debug)]
#[command(
    name = "feedback-intel",
    version,
    about = "Sentiment and intent classification for customer feedback."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Everything `report` prints.
#[derive(Serialize)]
struct Report {
    ingest:   IngestReport,
    analyzed: usize,
    summary:  AnalyticsSummary,
    trend:    Vec<TrendPoint>,
    negative: Vec<FeedbackRecord>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Report(args)  => run_report(args),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    match &args.corpus {
        Some(path) => tracing::info!("Starting training on corpus '{}'", path.display()),
        None       => tracing::info!("Starting training on the seed corpus"),
    }

    let summary = TrainUseCase::new(args.into()).execute()?;
    print_json(&summary)
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let service = AnalysisService::new(&args.artifact_dir);
    service
        .reload()
        .with_context(|| format!("no usable models in '{}'; run `train` first", args.artifact_dir.display()))?;

    let outcomes = service.analyzer()?.analyze_batch(&args.texts)?;
    print_json(&outcomes)
}

fn run_report(args: ReportArgs) -> Result<()> {
    let content = fs::read_to_string(&args.records)
        .with_context(|| format!("failed to read '{}'", args.records.display()))?;
    let records: Vec<FeedbackRecord> = serde_json::from_str(&content)
        .with_context(|| format!("'{}' is not a JSON array of feedback records", args.records.display()))?;

    let (store, ingest) = InMemoryFeedbackStore::from_records(records);
    if ingest.duplicates > 0 {
        tracing::warn!("Skipped {} records with duplicate ids", ingest.duplicates);
    }

    let service = if args.analyze {
        AnalysisService::init(&args.artifact_dir)
    } else {
        AnalysisService::new(&args.artifact_dir)
    };
    let use_case = AnalyzeUseCase::new(Arc::new(store), Arc::new(service));

    let analyzed = if args.analyze {
        use_case.analyze_pending().context("could not classify pending records")?
    } else {
        0
    };

    let aggregator = use_case.aggregator()?;
    print_json(&Report {
        ingest,
        analyzed,
        summary:  aggregator.summary(),
        trend:    aggregator.trend_by_date(),
        negative: aggregator.negative(args.negative_limit),
    })
}
