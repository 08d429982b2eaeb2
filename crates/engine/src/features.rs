//! Raw feature extraction.
//!
//! Produces the two daily inputs per entity: allocation pressure (a net-flow
//! value, or the dollar-flow proxy when no flow series exists) and relative
//! strength (entity return minus benchmark return). Pure functions only.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sector_alloc_core::{DailyBar, EntityId, RawFeatures};
use tracing::debug;

pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Combines one entity's inputs for one day into raw features.
    ///
    /// Relative strength is missing unless both returns are present. Non-finite
    /// inputs are treated as missing.
    #[must_use]
    pub fn extract(
        entity: &EntityId,
        date: NaiveDate,
        flow_raw: Option<f64>,
        entity_return: Option<f64>,
        benchmark_return: Option<f64>,
    ) -> RawFeatures {
        let allocation_pressure = flow_raw.filter(|v| v.is_finite());
        let relative_strength = match (entity_return, benchmark_return) {
            (Some(r), Some(b)) => Some(r - b).filter(|v| v.is_finite()),
            _ => None,
        };

        if allocation_pressure.is_none() || relative_strength.is_none() {
            debug!(
                %entity,
                %date,
                ap = ?allocation_pressure,
                rs = ?relative_strength,
                "Incomplete raw features"
            );
        }

        RawFeatures::new(allocation_pressure, relative_strength)
    }

    /// Dollar-flow proxy: `volume * (close - open)`.
    #[must_use]
    pub fn dollar_flow(bar: &DailyBar) -> Option<f64> {
        let spread = bar.close.checked_sub(bar.open)?;
        bar.volume.checked_mul(spread)?.to_f64()
    }

    /// Simple daily return `close / prior_close - 1`.
    ///
    /// Missing when the prior close is not positive.
    #[must_use]
    pub fn daily_return(prior_close: Decimal, close: Decimal) -> Option<f64> {
        if prior_close <= Decimal::ZERO {
            return None;
        }
        let ratio = close.checked_div(prior_close)?;
        (ratio - Decimal::ONE).to_f64()
    }
}
