//! Persisted result history: one CSV table keyed by (date, entity).

use crate::atomic::write_atomic;
use crate::error::DataError;
use chrono::NaiveDate;
use sector_alloc_core::{EntityId, HistoryRecord, HistorySink};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Column order of every history table and daily snapshot.
pub const HISTORY_COLUMNS: [&str; 10] = [
    "date",
    "entity",
    "composite_score",
    "state",
    "ap_zscore",
    "rs_zscore",
    "ap_raw",
    "rs_raw",
    "explanation",
    "status",
];

/// Row filter for [`CsvHistoryStore::load`]. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub entity: Option<EntityId>,
}

impl HistoryQuery {
    #[must_use]
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        self.start.map_or(true, |s| record.date >= s)
            && self.end.map_or(true, |e| record.date <= e)
            && self
                .entity
                .as_ref()
                .map_or(true, |e| e.as_str() == record.entity)
    }
}

/// De-duplicates on (date, entity), keeping the last occurrence, and sorts
/// by that key.
#[must_use]
pub fn dedup_latest(records: &[HistoryRecord]) -> Vec<HistoryRecord> {
    let mut by_key: BTreeMap<(NaiveDate, &str), &HistoryRecord> = BTreeMap::new();
    for record in records {
        by_key.insert((record.date, record.entity.as_str()), record);
    }
    by_key.into_values().cloned().collect()
}

/// Encodes rows as CSV with the fixed header. Missing values are empty
/// fields.
///
/// # Errors
///
/// Returns `DataError::Csv` if a row fails to serialize.
pub fn encode_records(path: &Path, records: &[HistoryRecord]) -> Result<Vec<u8>, DataError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HISTORY_COLUMNS)
        .map_err(|e| DataError::csv(path, e))?;
    for record in records {
        writer.serialize(record).map_err(|e| DataError::csv(path, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| DataError::io(path, e.into_error()))
}

/// The full history table at `{output_dir}/allocation_history.csv`.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub const FILE_NAME: &'static str = "allocation_history.csv";

    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(Self::FILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces the table with `records`, de-duplicated and sorted.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` if encoding or the atomic write fails. The
    /// previous table is left unchanged in that case.
    pub fn write(&self, records: &[HistoryRecord]) -> Result<usize, DataError> {
        let rows = dedup_latest(records);
        let bytes = encode_records(&self.path, &rows)?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!("Wrote {} history rows to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }

    /// Reads the rows matching `query`, in table order.
    ///
    /// A table that does not exist yet reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DataError::MalformedTable` for rows that do not decode, or an
    /// I/O / CSV error if the file cannot be read.
    pub fn load(&self, query: &HistoryQuery) -> Result<Vec<HistoryRecord>, DataError> {
        if !self.exists() {
            tracing::debug!("No history table at {}", self.path.display());
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| DataError::csv(&self.path, e))?;
        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<HistoryRecord>().enumerate() {
            let line = index as u64 + 2;
            let record = row.map_err(|e| DataError::from_row(&self.path, e, line))?;
            if query.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Reads every row.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_all(&self) -> Result<Vec<HistoryRecord>, DataError> {
        self.load(&HistoryQuery::default())
    }
}

impl HistorySink for CsvHistoryStore {
    fn replace_all(&mut self, records: &[HistoryRecord]) -> anyhow::Result<()> {
        self.write(records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_alloc_core::{AllocationState, BaselineStatus};
    use std::fs;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn record(day: u32, entity: &str, score: f64) -> HistoryRecord {
        HistoryRecord {
            date: date(day),
            entity: entity.to_string(),
            composite_score: score,
            state: AllocationState::Neutral,
            ap_zscore: None,
            rs_zscore: Some(0.25),
            ap_raw: None,
            rs_raw: Some(-0.0031),
            explanation: "Balanced, with a comma".to_string(),
            status: BaselineStatus::Partial,
        }
    }

    // ========== Write ==========

    #[test]
    fn test_write_sorts_and_dedups_keeping_last() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());

        let written = store
            .write(&[
                record(11, "XLK", 0.1),
                record(10, "XLE", 0.2),
                record(10, "XLB", 0.3),
                record(11, "XLK", 0.9),
            ])
            .unwrap();
        assert_eq!(written, 3);

        let rows = store.load_all().unwrap();
        let keys: Vec<(NaiveDate, &str)> =
            rows.iter().map(|r| (r.date, r.entity.as_str())).collect();
        assert_eq!(
            keys,
            vec![(date(10), "XLB"), (date(10), "XLE"), (date(11), "XLK")]
        );
        assert_eq!(rows[2].composite_score, 0.9);
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());
        store.write(&[record(10, "XLK", 0.5)]).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HISTORY_COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024-06-10,XLK,0.5,NEUTRAL,,0.25,,-0.0031,"));
        assert!(row.ends_with(",PARTIAL"));

        // Round trip keeps missing as None
        let back = store.load_all().unwrap();
        assert_eq!(back, vec![record(10, "XLK", 0.5)]);
    }

    #[test]
    fn test_empty_table_has_header() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());
        store.write(&[]).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim_end(), HISTORY_COLUMNS.join(","));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());
        let rows = vec![record(10, "XLK", 1.234_567_890_123), record(10, "XLE", -0.5)];

        store.write(&rows).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.write(&rows).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), first);
    }

    // ========== Load ==========

    #[test]
    fn test_load_filters() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());
        store
            .write(&[
                record(10, "XLK", 0.1),
                record(11, "XLK", 0.2),
                record(12, "XLK", 0.3),
                record(11, "XLE", 0.4),
            ])
            .unwrap();

        let query = HistoryQuery {
            start: Some(date(11)),
            end: Some(date(12)),
            entity: Some(EntityId::new("xlk")),
        };
        let rows = store.load(&query).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.entity == "XLK" && r.date >= date(11)));
    }

    #[test]
    fn test_missing_table_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(&dir.path().join("absent"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path());
        store.write(&[record(10, "XLK", 0.1)]).unwrap();

        let mut text = fs::read_to_string(store.path()).unwrap();
        text.push_str("2024-06-11,XLE,not-a-number,NEUTRAL,,,,,x,PARTIAL\n");
        fs::write(store.path(), text).unwrap();

        match store.load_all().unwrap_err() {
            DataError::MalformedTable { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sink_replaces_whole_table() {
        let dir = TempDir::new().unwrap();
        let mut store = CsvHistoryStore::new(dir.path());
        store.replace_all(&[record(10, "XLK", 0.1), record(11, "XLK", 0.2)]).unwrap();
        store.replace_all(&[record(12, "XLE", 0.3)]).unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, "XLE");
    }
}
