//! Converts raw features into z-scores against the rolling baselines.

use crate::baseline::RollingBaselineStore;
use crate::error::BaselineError;
use chrono::NaiveDate;
use sector_alloc_core::{BaselineStatus, EntityId, Feature, RawFeatures};
use std::collections::BTreeMap;

/// Z-scores for one entity on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatureSet {
    /// Only features that produced a defined z-score.
    pub z_scores: BTreeMap<Feature, f64>,
    /// Features without a z-score, in fixed feature order.
    pub excluded: Vec<Feature>,
    pub status: BaselineStatus,
}

/// Owns the baseline store and applies the score-then-update discipline:
/// a day's value is scored against the window as it stood before that day,
/// then appended.
#[derive(Debug, Clone)]
pub struct Normalizer {
    store: RollingBaselineStore,
}

impl Normalizer {
    #[must_use]
    pub fn new(store: RollingBaselineStore) -> Self {
        Self { store }
    }

    /// Scores the present features of `raw`, then records them.
    ///
    /// Missing features are excluded and leave their windows untouched.
    ///
    /// # Errors
    ///
    /// Propagates store errors, e.g. a date that does not advance the series.
    pub fn normalize(
        &mut self,
        entity: &EntityId,
        date: NaiveDate,
        raw: &RawFeatures,
    ) -> Result<NormalizedFeatureSet, BaselineError> {
        let mut z_scores = BTreeMap::new();
        let mut excluded = Vec::new();

        for feature in Feature::ALL {
            match raw
                .get(feature)
                .and_then(|value| self.store.zscore(entity, feature, value))
            {
                Some(z) => {
                    z_scores.insert(feature, z);
                }
                None => excluded.push(feature),
            }
        }

        for feature in Feature::ALL {
            if let Some(value) = raw.get(feature) {
                self.store.add_observation(entity, feature, value, date)?;
            }
        }

        let status = BaselineStatus::from_scored(z_scores.len(), Feature::ALL.len());
        Ok(NormalizedFeatureSet {
            z_scores,
            excluded,
            status,
        })
    }

    #[must_use]
    pub fn store(&self) -> &RollingBaselineStore {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> RollingBaselineStore {
        self.store
    }
}
