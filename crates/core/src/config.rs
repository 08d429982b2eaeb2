use crate::error::ConfigError;
use crate::types::Feature;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Tolerance for the weights-sum-to-one check.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub universe: UniverseConfig,
    pub normalization: NormalizationConfig,
    pub scoring: ScoringConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub benchmark: String,
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Rolling window capacity in trading days.
    pub window: usize,
    /// Observations required before a window produces statistics.
    pub min_observations: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: FeatureWeights,
}

/// Composite weights. Frozen conceptual allocations, not fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub allocation_pressure: f64,
    pub relative_strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the raw per-symbol CSV inputs.
    pub data_dir: PathBuf,
    /// Directory the history table and daily snapshots are written to.
    pub output_dir: PathBuf,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let entities = [
            ("XLY", "Consumer Discretionary"),
            ("XLI", "Industrials"),
            ("XLF", "Financials"),
            ("XLE", "Energy"),
            ("XLK", "Technology"),
            ("XLP", "Consumer Staples"),
            ("XLV", "Health Care"),
            ("XLU", "Utilities"),
            ("XLB", "Materials"),
            ("XLRE", "Real Estate"),
            ("AGG", "Aggregate Bond"),
        ]
        .into_iter()
        .map(|(symbol, name)| EntityConfig {
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect();

        Self {
            benchmark: "SPY".to_string(),
            entities,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            window: 63,
            min_observations: 21,
        }
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            allocation_pressure: 0.60,
            relative_strength: 0.40,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
        }
    }
}

impl FeatureWeights {
    #[must_use]
    pub const fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::AllocationPressure => self.allocation_pressure,
            Feature::RelativeStrength => self.relative_strength,
        }
    }

    /// Weight table in fixed feature order.
    #[must_use]
    pub fn table(&self) -> [(Feature, f64); 2] {
        Feature::ALL.map(|f| (f, self.weight(f)))
    }
}

impl AppConfig {
    /// Checks the invariants every component relies on.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let norm = &self.normalization;
        if norm.window == 0 {
            return Err(ConfigError::invalid(
                "normalization.window",
                "must be at least 1",
            ));
        }
        if norm.min_observations < 2 {
            return Err(ConfigError::invalid(
                "normalization.min_observations",
                "sample standard deviation needs at least 2 observations",
            ));
        }
        if norm.min_observations > norm.window {
            return Err(ConfigError::invalid(
                "normalization.min_observations",
                format!(
                    "{} exceeds window capacity {}",
                    norm.min_observations, norm.window
                ),
            ));
        }

        let universe = &self.universe;
        if universe.benchmark.trim().is_empty() {
            return Err(ConfigError::invalid("universe.benchmark", "must not be empty"));
        }
        if universe.entities.is_empty() {
            return Err(ConfigError::invalid(
                "universe.entities",
                "at least one entity is required",
            ));
        }

        let benchmark = universe.benchmark.trim().to_uppercase();
        let mut seen = HashSet::new();
        for entity in &universe.entities {
            let symbol = entity.symbol.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(ConfigError::invalid(
                    "universe.entities",
                    "entity symbol must not be empty",
                ));
            }
            if symbol == benchmark {
                return Err(ConfigError::invalid(
                    "universe.entities",
                    format!("benchmark {symbol} cannot also be an entity"),
                ));
            }
            if !seen.insert(symbol.clone()) {
                return Err(ConfigError::invalid(
                    "universe.entities",
                    format!("duplicate symbol {symbol}"),
                ));
            }
        }

        let mut sum = 0.0;
        for (feature, weight) in self.scoring.weights.table() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(
                    "scoring.weights",
                    format!("weight for {feature} must be finite and non-negative, got {weight}"),
                ));
            }
            sum += weight;
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::invalid(
                "scoring.weights",
                format!("weights must sum to 1.0, got {sum}"),
            ));
        }

        Ok(())
    }
}
