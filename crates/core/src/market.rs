//! Raw market inputs, fully materialized in memory before any scoring runs.

use crate::types::EntityId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Price bars and optional net-flow series keyed by symbol.
///
/// Series are stored date-ordered; inserting the same date twice keeps the
/// later value.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    bars: HashMap<EntityId, BTreeMap<NaiveDate, DailyBar>>,
    flows: HashMap<EntityId, BTreeMap<NaiveDate, f64>>,
}

impl MarketData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bars(&mut self, symbol: EntityId, bars: impl IntoIterator<Item = DailyBar>) {
        let series = self.bars.entry(symbol).or_default();
        for bar in bars {
            series.insert(bar.date, bar);
        }
    }

    /// Adds a net-flow series. Values must already be cleaned upstream; absent
    /// dates stay absent.
    pub fn insert_flows(
        &mut self,
        symbol: EntityId,
        flows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) {
        let series = self.flows.entry(symbol).or_default();
        for (date, value) in flows {
            series.insert(date, value);
        }
    }

    #[must_use]
    pub fn bar(&self, symbol: &EntityId, date: NaiveDate) -> Option<&DailyBar> {
        self.bars.get(symbol).and_then(|s| s.get(&date))
    }

    #[must_use]
    pub fn bars(&self, symbol: &EntityId) -> Option<&BTreeMap<NaiveDate, DailyBar>> {
        self.bars.get(symbol)
    }

    /// Flow series for a symbol, if one was supplied at all.
    #[must_use]
    pub fn flows(&self, symbol: &EntityId) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.flows.get(symbol)
    }

    /// Ascending dates on which the given symbol traded.
    #[must_use]
    pub fn trading_dates(&self, symbol: &EntityId) -> Vec<NaiveDate> {
        self.bars
            .get(symbol)
            .map(|s| s.keys().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
