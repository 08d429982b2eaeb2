//! Domain types for the sector allocation diagnostic.
//!
//! Discrete categories (`Feature`, `AllocationState`, `BaselineStatus`) are
//! closed enums so every classifier match is checked for exhaustiveness.
//! Result records (`SectorResult`, `DailyResult`) are built once and expose
//! read-only accessors.

use crate::config::UniverseConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one instrument in the fixed universe (or the benchmark).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an identifier from a ticker symbol. Symbols are upper-cased.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/// Raw features tracked per entity per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// Flow pressure: net capital flow, or its dollar-flow proxy.
    #[serde(rename = "AP")]
    AllocationPressure,
    /// Relative strength: entity return minus benchmark return.
    #[serde(rename = "RS")]
    RelativeStrength,
}

impl Feature {
    /// Every tracked feature, in fixed order.
    pub const ALL: [Feature; 2] = [Feature::AllocationPressure, Feature::RelativeStrength];

    /// Short code used in tables and explanations.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Feature::AllocationPressure => "AP",
            Feature::RelativeStrength => "RS",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Feature::AllocationPressure => "Allocation Pressure",
            Feature::RelativeStrength => "Relative Strength",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Discrete allocation state derived from the composite score.
///
/// States describe where capital is flowing. `Overweight` is not "buy" and
/// `Underweight` is not "sell".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationState {
    Overweight,
    Accumulating,
    Neutral,
    Decreasing,
    Underweight,
}

impl AllocationState {
    /// All states from most positive to most negative.
    pub const ALL: [AllocationState; 5] = [
        AllocationState::Overweight,
        AllocationState::Accumulating,
        AllocationState::Neutral,
        AllocationState::Decreasing,
        AllocationState::Underweight,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AllocationState::Overweight => "OVERWEIGHT",
            AllocationState::Accumulating => "ACCUMULATING",
            AllocationState::Neutral => "NEUTRAL",
            AllocationState::Decreasing => "DECREASING",
            AllocationState::Underweight => "UNDERWEIGHT",
        }
    }

    /// Generic description, used when no explanation collaborator is set.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            AllocationState::Overweight => "Strong positive allocation pressure",
            AllocationState::Accumulating => "Building allocation pressure",
            AllocationState::Neutral => "Balanced allocation",
            AllocationState::Decreasing => "Declining allocation pressure",
            AllocationState::Underweight => "Strong negative allocation pressure",
        }
    }
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completeness of the rolling baselines behind one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaselineStatus {
    /// Every tracked feature scored.
    Complete,
    /// Some, but not all, features scored.
    Partial,
    /// No feature scored.
    Insufficient,
}

impl BaselineStatus {
    /// Status of one entity given how many of its tracked features scored.
    #[must_use]
    pub const fn from_scored(scored: usize, tracked: usize) -> Self {
        if scored == 0 {
            BaselineStatus::Insufficient
        } else if scored >= tracked {
            BaselineStatus::Complete
        } else {
            BaselineStatus::Partial
        }
    }

    /// Overall status of a day: `Complete` iff all complete, `Insufficient`
    /// iff all insufficient (or there is nothing to aggregate), else `Partial`.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = BaselineStatus>,
    {
        let mut seen_any = false;
        let mut all_complete = true;
        let mut all_insufficient = true;

        for status in statuses {
            seen_any = true;
            all_complete &= status == BaselineStatus::Complete;
            all_insufficient &= status == BaselineStatus::Insufficient;
        }

        if !seen_any || all_insufficient {
            BaselineStatus::Insufficient
        } else if all_complete {
            BaselineStatus::Complete
        } else {
            BaselineStatus::Partial
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BaselineStatus::Complete => "COMPLETE",
            BaselineStatus::Partial => "PARTIAL",
            BaselineStatus::Insufficient => "INSUFFICIENT",
        }
    }
}

impl fmt::Display for BaselineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed instrument universe plus its benchmark.
///
/// Built once from configuration; membership never changes during a run.
#[derive(Debug, Clone)]
pub struct Universe {
    benchmark: EntityId,
    entities: Vec<EntityId>,
    names: BTreeMap<EntityId, String>,
}

impl Universe {
    #[must_use]
    pub fn from_config(config: &UniverseConfig) -> Self {
        let entities: Vec<EntityId> = config
            .entities
            .iter()
            .map(|e| EntityId::new(e.symbol.as_str()))
            .collect();
        let names = config
            .entities
            .iter()
            .map(|e| (EntityId::new(e.symbol.as_str()), e.name.clone()))
            .collect();

        Self {
            benchmark: EntityId::new(config.benchmark.as_str()),
            entities,
            names,
        }
    }

    #[must_use]
    pub fn benchmark(&self) -> &EntityId {
        &self.benchmark
    }

    /// Universe members in configured order (benchmark excluded).
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    #[must_use]
    pub fn contains(&self, entity: &EntityId) -> bool {
        self.names.contains_key(entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Display name for an entity, falling back to its symbol.
    #[must_use]
    pub fn display_name<'a>(&'a self, entity: &'a EntityId) -> &'a str {
        self.names
            .get(entity)
            .map_or_else(|| entity.as_str(), String::as_str)
    }
}

/// Raw (pre-normalization) feature values for one entity on one day.
///
/// `None` means the value could not be observed; it is never zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFeatures {
    pub allocation_pressure: Option<f64>,
    pub relative_strength: Option<f64>,
}

impl RawFeatures {
    #[must_use]
    pub const fn new(allocation_pressure: Option<f64>, relative_strength: Option<f64>) -> Self {
        Self {
            allocation_pressure,
            relative_strength,
        }
    }

    #[must_use]
    pub const fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::AllocationPressure => self.allocation_pressure,
            Feature::RelativeStrength => self.relative_strength,
        }
    }

    /// True when at least one feature was observed.
    #[must_use]
    pub const fn any_present(&self) -> bool {
        self.allocation_pressure.is_some() || self.relative_strength.is_some()
    }
}

/// Result for one entity on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorResult {
    entity: EntityId,
    composite_score: f64,
    state: AllocationState,
    explanation: String,
    z_scores: BTreeMap<Feature, f64>,
    raw: RawFeatures,
    status: BaselineStatus,
}

impl SectorResult {
    #[must_use]
    pub fn new(
        entity: EntityId,
        composite_score: f64,
        state: AllocationState,
        explanation: String,
        z_scores: BTreeMap<Feature, f64>,
        raw: RawFeatures,
        status: BaselineStatus,
    ) -> Self {
        Self {
            entity,
            composite_score,
            state,
            explanation,
            z_scores,
            raw,
            status,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    #[must_use]
    pub fn composite_score(&self) -> f64 {
        self.composite_score
    }

    #[must_use]
    pub fn state(&self) -> AllocationState {
        self.state
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Z-score of a feature, `None` when the feature was excluded.
    #[must_use]
    pub fn z_score(&self, feature: Feature) -> Option<f64> {
        self.z_scores.get(&feature).copied()
    }

    #[must_use]
    pub fn z_scores(&self) -> &BTreeMap<Feature, f64> {
        &self.z_scores
    }

    #[must_use]
    pub fn raw(&self) -> &RawFeatures {
        &self.raw
    }

    #[must_use]
    pub fn status(&self) -> BaselineStatus {
        self.status
    }

    /// Features that did not produce a z-score, in fixed feature order.
    #[must_use]
    pub fn excluded(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| !self.z_scores.contains_key(f))
            .collect()
    }
}

/// Aggregate result for one day across the universe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyResult {
    date: NaiveDate,
    sectors: Vec<SectorResult>,
    status: BaselineStatus,
}

impl DailyResult {
    /// Builds a day's result; the overall status is derived from the sectors.
    #[must_use]
    pub fn new(date: NaiveDate, sectors: Vec<SectorResult>) -> Self {
        let status = BaselineStatus::aggregate(sectors.iter().map(SectorResult::status));
        Self {
            date,
            sectors,
            status,
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn status(&self) -> BaselineStatus {
        self.status
    }

    #[must_use]
    pub fn sectors(&self) -> &[SectorResult] {
        &self.sectors
    }

    #[must_use]
    pub fn get(&self, entity: &EntityId) -> Option<&SectorResult> {
        self.sectors.iter().find(|s| s.entity() == entity)
    }

    #[must_use]
    pub fn overweight(&self) -> Vec<&SectorResult> {
        self.in_state(AllocationState::Overweight)
    }

    #[must_use]
    pub fn underweight(&self) -> Vec<&SectorResult> {
        self.in_state(AllocationState::Underweight)
    }

    #[must_use]
    pub fn in_state(&self, state: AllocationState) -> Vec<&SectorResult> {
        self.sectors.iter().filter(|s| s.state() == state).collect()
    }

    /// Number of sectors per state, for every state (zero counts included).
    #[must_use]
    pub fn state_counts(&self) -> BTreeMap<AllocationState, usize> {
        let mut counts: BTreeMap<AllocationState, usize> =
            AllocationState::ALL.into_iter().map(|s| (s, 0)).collect();
        for sector in &self.sectors {
            *counts.entry(sector.state()).or_insert(0) += 1;
        }
        counts
    }
}

/// One row of the persisted result history, keyed by (date, entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub entity: String,
    pub composite_score: f64,
    pub state: AllocationState,
    pub ap_zscore: Option<f64>,
    pub rs_zscore: Option<f64>,
    pub ap_raw: Option<f64>,
    pub rs_raw: Option<f64>,
    pub explanation: String,
    pub status: BaselineStatus,
}

impl HistoryRecord {
    #[must_use]
    pub fn from_sector(date: NaiveDate, sector: &SectorResult) -> Self {
        Self {
            date,
            entity: sector.entity().to_string(),
            composite_score: sector.composite_score(),
            state: sector.state(),
            ap_zscore: sector.z_score(Feature::AllocationPressure),
            rs_zscore: sector.z_score(Feature::RelativeStrength),
            ap_raw: sector.raw().allocation_pressure,
            rs_raw: sector.raw().relative_strength,
            explanation: sector.explanation().to_string(),
            status: sector.status(),
        }
    }

    /// Rows for every sector of a day, in the day's sector order.
    #[must_use]
    pub fn from_daily(result: &DailyResult) -> Vec<Self> {
        result
            .sectors()
            .iter()
            .map(|s| Self::from_sector(result.date(), s))
            .collect()
    }

    #[must_use]
    pub fn raw(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::AllocationPressure => self.ap_raw,
            Feature::RelativeStrength => self.rs_raw,
        }
    }

    #[must_use]
    pub fn z_score(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::AllocationPressure => self.ap_zscore,
            Feature::RelativeStrength => self.rs_zscore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn sector(symbol: &str, state: AllocationState, status: BaselineStatus) -> SectorResult {
        SectorResult::new(
            EntityId::new(symbol),
            0.0,
            state,
            state.description().to_string(),
            BTreeMap::new(),
            RawFeatures::default(),
            status,
        )
    }

    // ========== BaselineStatus ==========

    #[test]
    fn test_status_from_scored() {
        assert_eq!(BaselineStatus::from_scored(2, 2), BaselineStatus::Complete);
        assert_eq!(BaselineStatus::from_scored(1, 2), BaselineStatus::Partial);
        assert_eq!(BaselineStatus::from_scored(0, 2), BaselineStatus::Insufficient);
    }

    #[test]
    fn test_aggregate_all_complete() {
        let statuses = [BaselineStatus::Complete, BaselineStatus::Complete];
        assert_eq!(BaselineStatus::aggregate(statuses), BaselineStatus::Complete);
    }

    #[test]
    fn test_aggregate_all_insufficient() {
        let statuses = [BaselineStatus::Insufficient, BaselineStatus::Insufficient];
        assert_eq!(
            BaselineStatus::aggregate(statuses),
            BaselineStatus::Insufficient
        );
    }

    #[test]
    fn test_aggregate_mixed_is_partial() {
        let statuses = [BaselineStatus::Complete, BaselineStatus::Insufficient];
        assert_eq!(BaselineStatus::aggregate(statuses), BaselineStatus::Partial);
    }

    #[test]
    fn test_aggregate_empty_is_insufficient() {
        assert_eq!(
            BaselineStatus::aggregate(std::iter::empty()),
            BaselineStatus::Insufficient
        );
    }

    // ========== DailyResult ==========

    #[test]
    fn test_daily_result_accessors() {
        let result = DailyResult::new(
            day(),
            vec![
                sector("XLK", AllocationState::Overweight, BaselineStatus::Complete),
                sector("XLE", AllocationState::Underweight, BaselineStatus::Complete),
                sector("XLP", AllocationState::Neutral, BaselineStatus::Partial),
            ],
        );

        assert_eq!(result.status(), BaselineStatus::Partial);
        assert_eq!(result.overweight().len(), 1);
        assert_eq!(result.underweight()[0].entity().as_str(), "XLE");
        assert!(result.get(&EntityId::new("xlp")).is_some());
        assert!(result.get(&EntityId::new("XLU")).is_none());

        let counts = result.state_counts();
        assert_eq!(counts[&AllocationState::Overweight], 1);
        assert_eq!(counts[&AllocationState::Accumulating], 0);
    }

    #[test]
    fn test_empty_daily_result_is_insufficient() {
        let result = DailyResult::new(day(), Vec::new());
        assert_eq!(result.status(), BaselineStatus::Insufficient);
        assert!(result.sectors().is_empty());
    }

    // ========== Records ==========

    #[test]
    fn test_history_record_keeps_missing_values_missing() {
        let mut z = BTreeMap::new();
        z.insert(Feature::RelativeStrength, 0.75);
        let result = SectorResult::new(
            EntityId::new("XLB"),
            0.3,
            AllocationState::Neutral,
            "text".to_string(),
            z,
            RawFeatures::new(None, Some(0.004)),
            BaselineStatus::Partial,
        );

        let record = HistoryRecord::from_sector(day(), &result);
        assert_eq!(record.ap_zscore, None);
        assert_eq!(record.ap_raw, None);
        assert_eq!(record.rs_zscore, Some(0.75));
        assert_eq!(result.excluded(), vec![Feature::AllocationPressure]);
    }

    #[test]
    fn test_serde_names() {
        let state = serde_json::to_string(&AllocationState::Accumulating).unwrap();
        assert_eq!(state, "\"ACCUMULATING\"");
        let feature = serde_json::to_string(&Feature::RelativeStrength).unwrap();
        assert_eq!(feature, "\"RS\"");
    }
}
