//! Rebuilds rolling baselines from the persisted raw values and prints them.

use super::ConfigArgs;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use sector_alloc_core::{AppConfig, EntityId, Feature, RawFeatures, ReportFormatter, Universe};
use sector_alloc_data::CsvHistoryStore;
use sector_alloc_engine::{BaselineObservation, RollingBaselineStore, WindowSummary};

/// Arguments for the baselines command.
#[derive(Args, Debug, Clone, Default)]
pub struct BaselinesArgs {
    /// Only use history dated strictly before this date (YYYY-MM-DD)
    #[arg(long)]
    pub before: Option<NaiveDate>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the baselines command.
///
/// # Errors
/// Returns an error if configuration fails, the table cannot be read, or the
/// persisted rows cannot be replayed.
pub async fn run_baselines(args: BaselinesArgs) -> Result<()> {
    let config = args.config.load()?;
    let store = build_store(&config, args.before)?;
    let summary = store.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

/// Cold-starts a baseline store from the raw values in the history table.
///
/// # Errors
/// Returns an error if the table cannot be read or its rows are out of date
/// order for a series.
pub fn build_store(config: &AppConfig, before: Option<NaiveDate>) -> Result<RollingBaselineStore> {
    let universe = Universe::from_config(&config.universe);
    let table = CsvHistoryStore::new(&config.storage.output_dir);
    let rows = table.load_all()?;

    let observations: Vec<BaselineObservation> = rows
        .into_iter()
        .filter(|r| before.map_or(true, |b| r.date < b))
        .map(|r| BaselineObservation {
            entity: EntityId::new(r.entity.as_str()),
            date: r.date,
            raw: RawFeatures::new(
                r.raw(Feature::AllocationPressure),
                r.raw(Feature::RelativeStrength),
            ),
        })
        .collect();

    let mut store = RollingBaselineStore::new(&universe, &config.normalization);
    let stats = store
        .bulk_load(observations)
        .with_context(|| format!("Failed to replay {}", table.path().display()))?;
    tracing::info!(
        "Rebuilt baselines from {} values ({} rows skipped)",
        stats.loaded,
        stats.skipped
    );
    Ok(store)
}

fn format_summary(rows: &[WindowSummary]) -> String {
    let mut output = format!(
        "{:<6} {:<4} {:>5} {:<7} {:>14} {:>14} {:<10}\n",
        "Entity", "Feat", "Count", "Ready", "Mean", "Std", "Last"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<6} {:<4} {:>5} {:<7} {:>14} {:>14} {:<10}\n",
            row.entity.as_str(),
            row.feature.code(),
            format!("{}/{}", row.count, row.capacity),
            if row.ready { "yes" } else { "no" },
            format_stat(row.mean),
            format_stat(row.std),
            row.last_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        ));
    }
    output
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or_else(|| ReportFormatter::format_z(None), |v| format!("{v:.6}"))
}
