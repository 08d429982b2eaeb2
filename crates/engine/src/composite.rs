//! Weighted composite of per-feature z-scores.

use sector_alloc_core::{Feature, FeatureWeights};
use std::collections::BTreeMap;

/// Sums `weight * z` over the features that produced a z-score.
///
/// Absent features contribute nothing and the remaining weights are not
/// renormalized, so a partial composite is damped toward zero.
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer {
    weights: FeatureWeights,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new(FeatureWeights::default())
    }
}

impl CompositeScorer {
    #[must_use]
    pub fn new(weights: FeatureWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    /// Composite score; `0.0` when no feature is present.
    #[must_use]
    pub fn score(&self, z_scores: &BTreeMap<Feature, f64>) -> f64 {
        self.weights
            .table()
            .into_iter()
            .filter_map(|(feature, weight)| z_scores.get(&feature).map(|z| weight * z))
            .fold(0.0, |acc, term| acc + term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AP: Feature = Feature::AllocationPressure;
    const RS: Feature = Feature::RelativeStrength;

    fn z(pairs: &[(Feature, f64)]) -> BTreeMap<Feature, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_full_composite() {
        let scorer = CompositeScorer::default();
        assert_eq!(scorer.score(&z(&[(AP, 1.0), (RS, 1.0)])), 1.0);
        assert_eq!(scorer.score(&z(&[(AP, 5.0), (RS, 5.0)])), 5.0);
    }

    #[test]
    fn test_partial_composite_is_not_renormalized() {
        let scorer = CompositeScorer::default();
        assert_eq!(scorer.score(&z(&[(AP, 2.0)])), 1.2);
        assert!((scorer.score(&z(&[(RS, 2.0)])) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_composite_is_zero() {
        assert_eq!(CompositeScorer::default().score(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let scorer = CompositeScorer::new(FeatureWeights {
            allocation_pressure: 0.5,
            relative_strength: 0.5,
        });
        assert_eq!(scorer.score(&z(&[(AP, 2.0), (RS, -1.0)])), 0.5);
    }

    #[test]
    fn test_mixed_signs() {
        let score = CompositeScorer::default().score(&z(&[(AP, 1.5), (RS, 1.2)]));
        assert!((score - 1.38).abs() < 1e-12);
    }
}
