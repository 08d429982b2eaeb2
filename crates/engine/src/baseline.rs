//! Rolling per-(entity, feature) baselines.
//!
//! Each tracked series keeps a fixed-capacity window of its most recent raw
//! values. Statistics (mean, sample standard deviation, z-score) are only
//! defined once the window holds at least `min_observations` values. Z-scores
//! are never clipped.

use crate::error::BaselineError;
use chrono::NaiveDate;
use sector_alloc_core::{EntityId, Feature, NormalizationConfig, RawFeatures, Universe};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// Fixed-capacity window of raw values, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
    min_observations: usize,
    last_date: Option<NaiveDate>,
}

impl RollingWindow {
    #[must_use]
    pub fn new(capacity: usize, min_observations: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            min_observations,
            last_date: None,
        }
    }

    /// Appends a value, evicting the oldest one when full.
    ///
    /// Date ordering is enforced by [`RollingBaselineStore`], not here.
    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.last_date = Some(date);
        if self.capacity == 0 {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.min_observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if !self.is_ready() || self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator).
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        if !self.is_ready() || self.values.len() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let variance = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (self.values.len() - 1) as f64;
        Some(variance.sqrt())
    }

    /// `(value - mean) / std`.
    ///
    /// Undefined (rather than zero or infinite) when the window is not ready
    /// or its standard deviation is zero or non-finite.
    #[must_use]
    pub fn zscore(&self, value: f64) -> Option<f64> {
        let mean = self.mean()?;
        let std = self.std_dev()?;
        if std == 0.0 || !std.is_finite() {
            return None;
        }
        Some((value - mean) / std).filter(|z| z.is_finite())
    }
}

/// One historical observation for [`RollingBaselineStore::bulk_load`].
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineObservation {
    pub entity: EntityId,
    pub date: NaiveDate,
    pub raw: RawFeatures,
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkLoadStats {
    /// Values pushed into windows.
    pub loaded: usize,
    /// Records whose entity is not in the universe.
    pub skipped: usize,
}

/// Point-in-time view of one window, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub entity: EntityId,
    pub feature: Feature,
    pub count: usize,
    pub capacity: usize,
    pub ready: bool,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub last_date: Option<NaiveDate>,
}

/// Rolling windows for every (entity, feature) pair of a universe.
///
/// Observations for one series must arrive in strictly increasing date order.
/// The store has a single writer; readers see either the state before or after
/// a whole `add_observation` call.
#[derive(Debug, Clone)]
pub struct RollingBaselineStore {
    entities: Vec<EntityId>,
    windows: HashMap<(EntityId, Feature), RollingWindow>,
}

impl RollingBaselineStore {
    /// Creates empty windows for every universe entity and tracked feature.
    #[must_use]
    pub fn new(universe: &Universe, config: &NormalizationConfig) -> Self {
        let mut windows = HashMap::with_capacity(universe.len() * Feature::ALL.len());
        for entity in universe.entities() {
            for feature in Feature::ALL {
                windows.insert(
                    (entity.clone(), feature),
                    RollingWindow::new(config.window, config.min_observations),
                );
            }
        }

        tracing::debug!(
            entities = universe.len(),
            window = config.window,
            min_observations = config.min_observations,
            "Initialized baseline store"
        );

        Self {
            entities: universe.entities().to_vec(),
            windows,
        }
    }

    /// Appends one raw value to a series.
    ///
    /// # Errors
    ///
    /// - `UnknownSeries` if the entity is not in the universe
    /// - `OutOfOrder` if `date` is not after the series' last observation
    /// - `NonFinite` if `value` is NaN or infinite
    pub fn add_observation(
        &mut self,
        entity: &EntityId,
        feature: Feature,
        value: f64,
        date: NaiveDate,
    ) -> Result<(), BaselineError> {
        let window = self
            .windows
            .get_mut(&(entity.clone(), feature))
            .ok_or_else(|| BaselineError::UnknownSeries {
                entity: entity.clone(),
                feature,
            })?;

        if let Some(last) = window.last_date() {
            if date <= last {
                return Err(BaselineError::OutOfOrder {
                    entity: entity.clone(),
                    feature,
                    last,
                    attempted: date,
                });
            }
        }

        if !value.is_finite() {
            return Err(BaselineError::NonFinite {
                entity: entity.clone(),
                feature,
                date,
            });
        }

        window.push(date, value);
        Ok(())
    }

    #[must_use]
    pub fn window(&self, entity: &EntityId, feature: Feature) -> Option<&RollingWindow> {
        self.windows.get(&(entity.clone(), feature))
    }

    #[must_use]
    pub fn mean(&self, entity: &EntityId, feature: Feature) -> Option<f64> {
        self.window(entity, feature)?.mean()
    }

    #[must_use]
    pub fn std(&self, entity: &EntityId, feature: Feature) -> Option<f64> {
        self.window(entity, feature)?.std_dev()
    }

    /// Z-score of `value` against the current window, without modifying it.
    #[must_use]
    pub fn zscore(&self, entity: &EntityId, feature: Feature, value: f64) -> Option<f64> {
        self.window(entity, feature)?.zscore(value)
    }

    #[must_use]
    pub fn count(&self, entity: &EntityId, feature: Feature) -> usize {
        self.window(entity, feature).map_or(0, RollingWindow::len)
    }

    #[must_use]
    pub fn is_ready(&self, entity: &EntityId, feature: Feature) -> bool {
        self.window(entity, feature)
            .is_some_and(RollingWindow::is_ready)
    }

    /// Features of an entity whose windows are ready, in fixed feature order.
    #[must_use]
    pub fn ready_features(&self, entity: &EntityId) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.is_ready(entity, *f))
            .collect()
    }

    /// Features of an entity still accumulating observations.
    #[must_use]
    pub fn pending_features(&self, entity: &EntityId) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| !self.is_ready(entity, *f))
            .collect()
    }

    /// Total number of values held across all windows.
    #[must_use]
    pub fn total_observations(&self) -> usize {
        self.windows.values().map(RollingWindow::len).sum()
    }

    /// Warms the store from a historical series ordered oldest to newest.
    ///
    /// Missing raw values are skipped. Records for entities outside the
    /// universe are counted and ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotEmpty` if the store already holds observations, or the
    /// first `add_observation` error (e.g. records out of date order).
    pub fn bulk_load<I>(&mut self, records: I) -> Result<BulkLoadStats, BaselineError>
    where
        I: IntoIterator<Item = BaselineObservation>,
    {
        let existing = self.total_observations();
        if existing > 0 {
            return Err(BaselineError::NotEmpty {
                observations: existing,
            });
        }

        let mut stats = BulkLoadStats::default();
        for record in records {
            if !self.entities.contains(&record.entity) {
                stats.skipped += 1;
                continue;
            }
            for feature in Feature::ALL {
                if let Some(value) = record.raw.get(feature) {
                    self.add_observation(&record.entity, feature, value, record.date)?;
                    stats.loaded += 1;
                }
            }
        }

        if stats.skipped > 0 {
            tracing::warn!(
                skipped = stats.skipped,
                "Skipped history records for entities outside the universe"
            );
        }
        tracing::info!(loaded = stats.loaded, "Bulk-loaded baseline observations");

        Ok(stats)
    }

    /// Per-window diagnostics in universe order, then feature order.
    #[must_use]
    pub fn summary(&self) -> Vec<WindowSummary> {
        let mut rows = Vec::with_capacity(self.windows.len());
        for entity in &self.entities {
            for feature in Feature::ALL {
                if let Some(window) = self.window(entity, feature) {
                    rows.push(WindowSummary {
                        entity: entity.clone(),
                        feature,
                        count: window.len(),
                        capacity: window.capacity(),
                        ready: window.is_ready(),
                        mean: window.mean(),
                        std: window.std_dev(),
                        last_date: window.last_date(),
                    });
                }
            }
        }
        rows
    }
}
