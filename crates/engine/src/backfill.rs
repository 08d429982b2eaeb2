//! Full-history replay.
//!
//! Every run rebuilds the baselines from scratch by replaying each trading
//! day (taken from the benchmark's bars) in order up to the target date, then
//! replaces the persisted history wholesale. Identical inputs therefore give
//! identical history, and a replay is always consistent with the rolling
//! windows it implies.

use crate::baseline::RollingBaselineStore;
use crate::classifier::StateClassifier;
use crate::composite::CompositeScorer;
use crate::error::EngineError;
use crate::features::FeatureExtractor;
use crate::normalizer::Normalizer;
use chrono::NaiveDate;
use sector_alloc_core::{
    AppConfig, DailyResult, EntityId, ExplanationInput, Explainer, HistoryRecord, HistorySink,
    MarketData, NormalizationConfig, SectorResult, Universe,
};

/// Every day produced by one replay, plus the baselines it left behind.
#[derive(Debug, Clone)]
pub struct BackfillRun {
    days: Vec<DailyResult>,
    baselines: RollingBaselineStore,
    benchmark_available: bool,
}

impl BackfillRun {
    /// Scored days in ascending date order.
    #[must_use]
    pub fn days(&self) -> &[DailyResult] {
        &self.days
    }

    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DailyResult> {
        self.days
            .binary_search_by_key(&date, DailyResult::date)
            .ok()
            .map(|i| &self.days[i])
    }

    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.days.last().map(DailyResult::date)
    }

    #[must_use]
    pub fn baselines(&self) -> &RollingBaselineStore {
        &self.baselines
    }

    /// False when the benchmark had fewer than two bars, so nothing was scored.
    #[must_use]
    pub fn benchmark_available(&self) -> bool {
        self.benchmark_available
    }

    /// Flattened history rows, ordered by date then universe order.
    #[must_use]
    pub fn history_records(&self) -> Vec<HistoryRecord> {
        self.days.iter().flat_map(HistoryRecord::from_daily).collect()
    }
}

/// Replays history and persists the re-derived result table.
pub struct BackfillOrchestrator {
    universe: Universe,
    normalization: NormalizationConfig,
    scorer: CompositeScorer,
    explainer: Option<Box<dyn Explainer>>,
}

impl BackfillOrchestrator {
    #[must_use]
    pub fn new(universe: Universe, config: &AppConfig) -> Self {
        Self {
            universe,
            normalization: config.normalization.clone(),
            scorer: CompositeScorer::new(config.scoring.weights),
            explainer: None,
        }
    }

    /// Uses `explainer` for result text instead of the generic state description.
    #[must_use]
    pub fn with_explainer(mut self, explainer: Box<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    #[must_use]
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Replays every benchmark trading day up to and including `target`.
    ///
    /// Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Baseline` if the store rejects an observation.
    pub fn replay(&self, data: &MarketData, target: NaiveDate) -> Result<BackfillRun, EngineError> {
        let store = RollingBaselineStore::new(&self.universe, &self.normalization);
        let benchmark = self.universe.benchmark();

        let benchmark_bars = data.bars(benchmark);
        let dates: Vec<NaiveDate> = benchmark_bars
            .map(|bars| bars.keys().copied().take_while(|d| *d <= target).collect())
            .unwrap_or_default();

        let Some(benchmark_bars) = benchmark_bars.filter(|_| dates.len() >= 2) else {
            tracing::warn!(
                "Benchmark {} has fewer than two bars through {}, nothing to score",
                benchmark,
                target
            );
            return Ok(BackfillRun {
                days: Vec::new(),
                baselines: store,
                benchmark_available: false,
            });
        };

        tracing::info!(
            target_date = %target,
            trading_days = dates.len().saturating_sub(1),
            entities = self.universe.len(),
            "Starting backfill"
        );

        let mut normalizer = Normalizer::new(store);
        let mut days = Vec::with_capacity(dates.len());

        for pair in dates.windows(2) {
            let (prior, today) = (pair[0], pair[1]);
            let benchmark_return = match (benchmark_bars.get(&prior), benchmark_bars.get(&today)) {
                (Some(p), Some(t)) => FeatureExtractor::daily_return(p.close, t.close),
                _ => None,
            };

            let mut sectors = Vec::with_capacity(self.universe.len());
            for entity in self.universe.entities() {
                sectors.push(self.score_entity(
                    &mut normalizer,
                    data,
                    entity,
                    prior,
                    today,
                    benchmark_return,
                )?);
            }

            let result = DailyResult::new(today, sectors);
            tracing::debug!(date = %today, status = %result.status(), "Scored day");
            days.push(result);
        }

        Ok(BackfillRun {
            days,
            baselines: normalizer.into_store(),
            benchmark_available: true,
        })
    }

    fn score_entity(
        &self,
        normalizer: &mut Normalizer,
        data: &MarketData,
        entity: &EntityId,
        prior: NaiveDate,
        today: NaiveDate,
        benchmark_return: Option<f64>,
    ) -> Result<SectorResult, EngineError> {
        let bar = data.bar(entity, today);

        let flow_raw = match data.flows(entity) {
            Some(series) => series.get(&today).copied(),
            None => bar.and_then(FeatureExtractor::dollar_flow),
        };
        let entity_return = match (data.bar(entity, prior), bar) {
            (Some(p), Some(t)) => FeatureExtractor::daily_return(p.close, t.close),
            _ => None,
        };

        let raw = FeatureExtractor::extract(entity, today, flow_raw, entity_return, benchmark_return);
        let normalized = normalizer.normalize(entity, today, &raw)?;
        let score = self.scorer.score(&normalized.z_scores);
        let state = StateClassifier::classify_with_status(score, normalized.status);

        let explanation = match &self.explainer {
            Some(explainer) => explainer.explain(&ExplanationInput {
                entity,
                state,
                z_scores: &normalized.z_scores,
                excluded: &normalized.excluded,
                status: normalized.status,
            }),
            None => state.description().to_string(),
        };

        Ok(SectorResult::new(
            entity.clone(),
            score,
            state,
            explanation,
            normalized.z_scores,
            raw,
            normalized.status,
        ))
    }

    /// Replays, persists the whole history through `sink`, and returns the
    /// target day's result.
    ///
    /// Without a usable benchmark series the result is an empty INSUFFICIENT
    /// day and the sink is not touched.
    ///
    /// # Errors
    ///
    /// - `Baseline` if the replay fails
    /// - `Persistence` if the sink fails (the previous table stays intact)
    /// - `TargetDateNotFound` if `target` was not a scored day; the history
    ///   has still been persisted
    pub fn run<S>(
        &self,
        data: &MarketData,
        target: NaiveDate,
        sink: &mut S,
    ) -> Result<DailyResult, EngineError>
    where
        S: HistorySink + ?Sized,
    {
        let run = self.replay(data, target)?;
        if !run.benchmark_available() {
            return Ok(DailyResult::new(target, Vec::new()));
        }

        let records = run.history_records();
        if let Err(e) = sink.replace_all(&records) {
            tracing::error!("Failed to persist {} history rows: {e:#}", records.len());
            return Err(EngineError::Persistence(e));
        }
        tracing::info!(
            "Persisted {} history rows across {} days",
            records.len(),
            run.days().len()
        );

        match run.day(target) {
            Some(result) => {
                tracing::info!(
                    date = %target,
                    status = %result.status(),
                    overweight = result.overweight().len(),
                    underweight = result.underweight().len(),
                    "Backfill complete"
                );
                Ok(result.clone())
            }
            None => Err(EngineError::TargetDateNotFound {
                target,
                latest: run.latest_date(),
            }),
        }
    }
}

/// In-memory [`HistorySink`] that keeps the last table written.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Vec<HistoryRecord>,
    writes: usize,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Number of `replace_all` calls received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl HistorySink for MemoryHistory {
    fn replace_all(&mut self, records: &[HistoryRecord]) -> anyhow::Result<()> {
        self.records = records.to_vec();
        self.writes += 1;
        Ok(())
    }
}
