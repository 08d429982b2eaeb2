use crate::market::MarketData;
use crate::types::{AllocationState, BaselineStatus, EntityId, Feature, HistoryRecord, Universe};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Upstream collaborator that fetches (and caches, and rate-limits) raw
/// inputs. Must fully materialize its data before the engine starts.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn load(&self, universe: &Universe, through: NaiveDate) -> Result<MarketData>;
    fn name(&self) -> &str;
}

/// Destination for the fully re-derived result history.
///
/// Implementations replace the whole table atomically: after a failed call
/// the previous table must be left unchanged.
pub trait HistorySink {
    fn replace_all(&mut self, records: &[HistoryRecord]) -> Result<()>;
}

/// Everything an explanation collaborator may look at.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationInput<'a> {
    pub entity: &'a EntityId,
    pub state: AllocationState,
    pub z_scores: &'a BTreeMap<Feature, f64>,
    pub excluded: &'a [Feature],
    pub status: BaselineStatus,
}

/// Produces the text explanation for one entity's result.
///
/// Implementations must be deterministic and free of side effects.
pub trait Explainer: Send + Sync {
    fn explain(&self, input: &ExplanationInput<'_>) -> String;
}
