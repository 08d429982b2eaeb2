//! Storage and inputs for the sector allocation diagnostic.
//!
//! This crate provides:
//! - A CSV directory market-data source with flow outlier filtering
//! - The persisted result history table (atomic whole-table replace)
//! - Per-day result snapshots

pub mod atomic;
pub mod csv_source;
pub mod error;
pub mod flow_filter;
pub mod history_store;
pub mod snapshot;

pub use atomic::write_atomic;
pub use csv_source::CsvDirectorySource;
pub use error::DataError;
pub use flow_filter::FlowOutlierFilter;
pub use history_store::{dedup_latest, CsvHistoryStore, HistoryQuery, HISTORY_COLUMNS};
pub use snapshot::DailySnapshot;
