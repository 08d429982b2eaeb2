//! Daily run: replay the full history, persist it, and report the target day.

use super::ConfigArgs;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use sector_alloc_core::{
    AppConfig, DailyResult, MarketDataSource, ReportFormatter, Universe,
};
use sector_alloc_data::{CsvDirectorySource, CsvHistoryStore, DailySnapshot};
use sector_alloc_engine::{BackfillOrchestrator, ExplanationGenerator, MemoryHistory};

/// Arguments for the run-daily command.
#[derive(Args, Debug, Clone, Default)]
pub struct RunDailyArgs {
    /// Target date (YYYY-MM-DD). Defaults to the latest benchmark bar.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the target day as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Compute without writing the history table or snapshot
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the run-daily command.
///
/// # Errors
/// Returns an error if configuration, data loading, the backfill, or
/// persistence fails.
pub async fn run_run_daily(args: RunDailyArgs) -> Result<()> {
    let config = args.config.load()?;
    let universe = Universe::from_config(&config.universe);
    let result = execute(&config, args.date, !args.dry_run).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print!("{}", ReportFormatter::format(&result, &universe));
    for sector in result.overweight().into_iter().chain(result.underweight()) {
        println!(
            "{}",
            ExplanationGenerator::format_summary(
                universe.display_name(sector.entity()),
                sector.entity(),
                sector.state(),
                sector.composite_score(),
            )
        );
        println!("    {}", sector.explanation());
    }

    Ok(())
}

/// Loads inputs, replays history up to the target date, and (when `persist`
/// is set) replaces the history table and writes the day's snapshot.
///
/// # Errors
/// Returns an error if data loading fails or the engine reports an error,
/// including a target date that has no computed result.
pub async fn execute(
    config: &AppConfig,
    date: Option<NaiveDate>,
    persist: bool,
) -> Result<DailyResult> {
    let universe = Universe::from_config(&config.universe);
    let benchmark = universe.benchmark().clone();

    let source = CsvDirectorySource::new(&config.storage.data_dir);
    tracing::info!("Loading market data via {} source", source.name());
    let data = source
        .load(&universe, date.unwrap_or(NaiveDate::MAX))
        .await
        .with_context(|| {
            format!(
                "Failed to load market data from {}",
                config.storage.data_dir.display()
            )
        })?;

    let target = date
        .or_else(|| data.trading_dates(&benchmark).last().copied())
        .unwrap_or_else(|| Utc::now().date_naive());

    let orchestrator = BackfillOrchestrator::new(universe, config)
        .with_explainer(Box::new(ExplanationGenerator::new(benchmark)));

    let result = if persist {
        let mut store = CsvHistoryStore::new(&config.storage.output_dir);
        let result = orchestrator.run(&data, target, &mut store)?;
        if !result.sectors().is_empty() {
            DailySnapshot::write(&config.storage.output_dir, &result)?;
        }
        result
    } else {
        orchestrator.run(&data, target, &mut MemoryHistory::new())?
    };

    Ok(result)
}
