//! Prints rows of the persisted history table.

use super::ConfigArgs;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sector_alloc_core::{EntityId, HistoryRecord};
use sector_alloc_data::{CsvHistoryStore, HistoryQuery};

/// Arguments for the history command.
#[derive(Args, Debug, Clone, Default)]
pub struct HistoryArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Restrict to one entity symbol
    #[arg(long)]
    pub entity: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the history command.
///
/// # Errors
/// Returns an error if configuration fails or the table cannot be read.
pub async fn run_history(args: HistoryArgs) -> Result<()> {
    let config = args.config.load()?;
    let store = CsvHistoryStore::new(&config.storage.output_dir);
    let query = HistoryQuery {
        start: args.start,
        end: args.end,
        entity: args.entity.as_deref().map(EntityId::new),
    };

    let rows = store.load(&query)?;
    tracing::info!("Read {} rows from {}", rows.len(), store.path().display());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", format_rows(&rows));
    }
    Ok(())
}

fn format_rows(rows: &[HistoryRecord]) -> String {
    let mut output = format!(
        "{:<10} {:<6} {:>7} {:<14} {:>7} {:>7} {:<12}\n",
        "Date", "Entity", "Score", "State", "AP(z)", "RS(z)", "Status"
    );
    for row in rows {
        output.push_str(&format!(
            "{:<10} {:<6} {:>+7.2} {:<14} {:>7} {:>7} {:<12}\n",
            row.date.format("%Y-%m-%d"),
            row.entity,
            row.composite_score,
            row.state.as_str(),
            sector_alloc_core::ReportFormatter::format_z(row.ap_zscore),
            sector_alloc_core::ReportFormatter::format_z(row.rs_zscore),
            row.status.as_str(),
        ));
    }
    if rows.is_empty() {
        output.push_str("(no rows)\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_alloc_core::{AllocationState, BaselineStatus};

    #[test]
    fn test_format_rows() {
        let row = HistoryRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
            entity: "XLK".to_string(),
            composite_score: 1.38,
            state: AllocationState::Overweight,
            ap_zscore: Some(1.5),
            rs_zscore: Some(1.2),
            ap_raw: Some(1.0),
            rs_raw: Some(0.01),
            explanation: String::new(),
            status: BaselineStatus::Complete,
        };
        let text = format_rows(&[row]);
        assert!(text.contains("2024-06-14 XLK"));
        assert!(text.contains("+1.38"));
        assert!(text.contains("COMPLETE"));

        assert!(format_rows(&[]).contains("(no rows)"));
    }
}
