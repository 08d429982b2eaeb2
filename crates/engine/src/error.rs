use chrono::NaiveDate;
use sector_alloc_core::{EntityId, Feature};
use thiserror::Error;

/// Errors raised by the rolling baseline store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BaselineError {
    /// The (entity, feature) pair is not part of the configured universe.
    #[error("no baseline window for {entity}/{feature}")]
    UnknownSeries { entity: EntityId, feature: Feature },

    /// Observations must arrive in strictly increasing date order.
    #[error(
        "observation for {entity}/{feature} dated {attempted} is not after the last observation ({last})"
    )]
    OutOfOrder {
        entity: EntityId,
        feature: Feature,
        last: NaiveDate,
        attempted: NaiveDate,
    },

    /// NaN and infinities never enter a window.
    #[error("non-finite value for {entity}/{feature} on {date}")]
    NonFinite {
        entity: EntityId,
        feature: Feature,
        date: NaiveDate,
    },

    /// Bulk loading is only allowed into an empty store.
    #[error("bulk load requires an empty store, {observations} observations already present")]
    NotEmpty { observations: usize },
}

/// Errors surfaced by a backfill run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Baseline(#[from] BaselineError),

    /// The history sink rejected the write. The previous table is intact.
    #[error("failed to persist result history: {0:#}")]
    Persistence(anyhow::Error),

    /// The history was persisted, but the target date was never scored.
    #[error(
        "no result computed for target date {target} (latest scored date: {})",
        display_latest(.latest)
    )]
    TargetDateNotFound {
        target: NaiveDate,
        latest: Option<NaiveDate>,
    },
}

fn display_latest(latest: &Option<NaiveDate>) -> String {
    latest.map_or_else(|| "none".to_string(), |d| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_not_found_message() {
        let err = EngineError::TargetDateNotFound {
            target: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            latest: NaiveDate::from_ymd_opt(2024, 6, 14),
        };
        let msg = err.to_string();
        assert!(msg.contains("2024-06-15"));
        assert!(msg.contains("latest scored date: 2024-06-14"));

        let err = EngineError::TargetDateNotFound {
            target: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            latest: None,
        };
        assert!(err.to_string().contains("latest scored date: none"));
    }

    #[test]
    fn test_persistence_error_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("writing history");
        let err = EngineError::Persistence(inner);
        let msg = err.to_string();
        assert!(msg.contains("writing history"));
        assert!(msg.contains("disk full"));
    }
}
