//! Market data from a directory of per-symbol CSV files.
//!
//! Layout under `data_dir`:
//! - `{SYMBOL}.csv` with `date,open,high,low,close,volume`
//! - `flows/{SYMBOL}.csv` with `date,net_flow` (optional)

use crate::error::DataError;
use crate::flow_filter::FlowOutlierFilter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sector_alloc_core::{DailyBar, EntityId, MarketData, MarketDataSource, Universe};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct BarRow {
    date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    volume: Decimal,
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    date: NaiveDate,
    net_flow: f64,
}

#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    data_dir: PathBuf,
    outlier_filter: FlowOutlierFilter,
}

impl CsvDirectorySource {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            outlier_filter: FlowOutlierFilter::default(),
        }
    }

    #[must_use]
    pub fn with_outlier_filter(mut self, filter: FlowOutlierFilter) -> Self {
        self.outlier_filter = filter;
        self
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn bars_path(&self, symbol: &EntityId) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    #[must_use]
    pub fn flows_path(&self, symbol: &EntityId) -> PathBuf {
        self.data_dir.join("flows").join(format!("{symbol}.csv"))
    }

    /// Reads a bar file in file order.
    ///
    /// # Errors
    ///
    /// Returns `DataError::MalformedTable` for rows that do not decode.
    pub fn read_bars(path: &Path) -> Result<Vec<DailyBar>, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
        let mut bars = Vec::new();
        for (index, row) in reader.deserialize::<BarRow>().enumerate() {
            let row = row.map_err(|e| DataError::from_row(path, e, index as u64 + 2))?;
            bars.push(DailyBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(bars)
    }

    /// Reads a net-flow file. Non-finite values are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DataError::MalformedTable` for rows that do not decode.
    pub fn read_flows(path: &Path) -> Result<Vec<(NaiveDate, f64)>, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::csv(path, e))?;
        let mut flows = Vec::new();
        for (index, row) in reader.deserialize::<FlowRow>().enumerate() {
            let row = row.map_err(|e| DataError::from_row(path, e, index as u64 + 2))?;
            if row.net_flow.is_finite() {
                flows.push((row.date, row.net_flow));
            } else {
                tracing::warn!("Skipping non-finite flow on {} in {}", row.date, path.display());
            }
        }
        Ok(flows)
    }

    /// Loads the benchmark and every universe entity, keeping rows dated on or
    /// before `through`.
    ///
    /// Missing files are logged and skipped; the engine treats the affected
    /// symbols as missing data.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` if an existing file cannot be read or decoded.
    pub fn load_blocking(
        &self,
        universe: &Universe,
        through: NaiveDate,
    ) -> Result<MarketData, DataError> {
        let mut data = MarketData::new();
        let symbols = std::iter::once(universe.benchmark()).chain(universe.entities());

        for symbol in symbols {
            let bars_path = self.bars_path(symbol);
            if bars_path.is_file() {
                let bars: Vec<DailyBar> = Self::read_bars(&bars_path)?
                    .into_iter()
                    .filter(|b| b.date <= through)
                    .collect();
                tracing::debug!("Loaded {} bars for {}", bars.len(), symbol);
                data.insert_bars(symbol.clone(), bars);
            } else {
                tracing::warn!("No price file for {} at {}", symbol, bars_path.display());
            }

            // The benchmark only contributes prices
            if symbol == universe.benchmark() {
                continue;
            }

            let flows_path = self.flows_path(symbol);
            if flows_path.is_file() {
                let flows: Vec<(NaiveDate, f64)> = Self::read_flows(&flows_path)?
                    .into_iter()
                    .filter(|(d, _)| *d <= through)
                    .collect();
                let flows = self.outlier_filter.filter(symbol, flows);
                data.insert_flows(symbol.clone(), flows);
            }
        }

        tracing::info!(
            "Loaded market data for {} symbols from {}",
            data.symbol_count(),
            self.data_dir.display()
        );
        Ok(data)
    }
}

#[async_trait]
impl MarketDataSource for CsvDirectorySource {
    async fn load(&self, universe: &Universe, through: NaiveDate) -> Result<MarketData> {
        let source = self.clone();
        let universe = universe.clone();
        let data = tokio::task::spawn_blocking(move || source.load_blocking(&universe, through))
            .await
            .context("Market data loader task failed")??;
        Ok(data)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
