use crate::atomic::write_atomic;
use crate::error::DataError;
use crate::history_store::encode_records;
use chrono::NaiveDate;
use sector_alloc_core::{DailyResult, HistoryRecord};
use std::path::{Path, PathBuf};

/// Per-day copy of the target day's rows at `{output_dir}/daily/{date}.csv`.
pub struct DailySnapshot;

impl DailySnapshot {
    pub const DIR_NAME: &'static str = "daily";

    #[must_use]
    pub fn path_for(output_dir: &Path, date: NaiveDate) -> PathBuf {
        output_dir
            .join(Self::DIR_NAME)
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    /// Writes the day's rows, in the day's sector order, atomically.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` if encoding or the write fails.
    pub fn write(output_dir: &Path, result: &DailyResult) -> Result<PathBuf, DataError> {
        let path = Self::path_for(output_dir, result.date());
        let bytes = encode_records(&path, &HistoryRecord::from_daily(result))?;
        write_atomic(&path, &bytes)?;
        tracing::info!("Wrote daily snapshot {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sector_alloc_core::{
        AllocationState, BaselineStatus, EntityId, RawFeatures, SectorResult,
    };
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_path_and_rows() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let sectors = ["XLK", "XLE"]
            .into_iter()
            .map(|s| {
                SectorResult::new(
                    EntityId::new(s),
                    0.0,
                    AllocationState::Neutral,
                    "Balanced allocation".to_string(),
                    BTreeMap::new(),
                    RawFeatures::default(),
                    BaselineStatus::Insufficient,
                )
            })
            .collect();
        let result = DailyResult::new(date, sectors);

        let path = DailySnapshot::write(dir.path(), &result).unwrap();
        assert_eq!(path, dir.path().join("daily").join("2024-06-14.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",XLK,"));
        assert!(lines[2].contains(",XLE,"));
    }
}
