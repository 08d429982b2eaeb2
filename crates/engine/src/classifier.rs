//! Maps composite scores onto the five allocation states.

use sector_alloc_core::{AllocationState, BaselineStatus};

/// Score above which a sector is `Overweight`.
pub const OVERWEIGHT_ABOVE: f64 = 1.0;
/// Score above which a sector is `Accumulating`.
pub const ACCUMULATING_ABOVE: f64 = 0.3;
/// Lowest score that is still `Neutral`.
pub const NEUTRAL_FLOOR: f64 = -0.3;
/// Lowest score that is still `Decreasing`.
pub const DECREASING_FLOOR: f64 = -1.0;

pub struct StateClassifier;

impl StateClassifier {
    /// Thresholds are fixed:
    ///
    /// | score            | state          |
    /// |------------------|----------------|
    /// | > 1.0            | `Overweight`   |
    /// | (0.3, 1.0]       | `Accumulating` |
    /// | [-0.3, 0.3]      | `Neutral`      |
    /// | [-1.0, -0.3)     | `Decreasing`   |
    /// | < -1.0           | `Underweight`  |
    ///
    /// NaN maps to `Neutral`.
    #[must_use]
    pub fn classify(score: f64) -> AllocationState {
        if score.is_nan() {
            AllocationState::Neutral
        } else if score > OVERWEIGHT_ABOVE {
            AllocationState::Overweight
        } else if score > ACCUMULATING_ABOVE {
            AllocationState::Accumulating
        } else if score >= NEUTRAL_FLOOR {
            AllocationState::Neutral
        } else if score >= DECREASING_FLOOR {
            AllocationState::Decreasing
        } else {
            AllocationState::Underweight
        }
    }

    /// Like [`classify`](Self::classify), but an entity without any scored
    /// feature is always `Neutral`.
    #[must_use]
    pub fn classify_with_status(score: f64, status: BaselineStatus) -> AllocationState {
        match status {
            BaselineStatus::Insufficient => AllocationState::Neutral,
            BaselineStatus::Complete | BaselineStatus::Partial => Self::classify(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_exact() {
        assert_eq!(StateClassifier::classify(1.0), AllocationState::Accumulating);
        assert_eq!(
            StateClassifier::classify(1.000_001),
            AllocationState::Overweight
        );
        assert_eq!(
            StateClassifier::classify(0.300_001),
            AllocationState::Accumulating
        );
        assert_eq!(StateClassifier::classify(0.3), AllocationState::Neutral);
        assert_eq!(StateClassifier::classify(-0.3), AllocationState::Neutral);
        assert_eq!(
            StateClassifier::classify(-0.300_001),
            AllocationState::Decreasing
        );
        assert_eq!(StateClassifier::classify(-1.0), AllocationState::Decreasing);
        assert_eq!(
            StateClassifier::classify(-1.000_001),
            AllocationState::Underweight
        );
    }

    #[test]
    fn test_extreme_scores() {
        assert_eq!(StateClassifier::classify(100.0), AllocationState::Overweight);
        assert_eq!(
            StateClassifier::classify(-100.0),
            AllocationState::Underweight
        );
    }

    #[test]
    fn test_interior_values() {
        assert_eq!(StateClassifier::classify(1.38), AllocationState::Overweight);
        assert_eq!(StateClassifier::classify(0.5), AllocationState::Accumulating);
        assert_eq!(StateClassifier::classify(0.0), AllocationState::Neutral);
        assert_eq!(StateClassifier::classify(-0.5), AllocationState::Decreasing);
        assert_eq!(StateClassifier::classify(-4.0), AllocationState::Underweight);
    }

    #[test]
    fn test_insufficient_is_always_neutral() {
        assert_eq!(
            StateClassifier::classify_with_status(3.0, BaselineStatus::Insufficient),
            AllocationState::Neutral
        );
        assert_eq!(
            StateClassifier::classify_with_status(1.2, BaselineStatus::Partial),
            AllocationState::Overweight
        );
    }

    #[test]
    fn test_nan_is_neutral() {
        assert_eq!(StateClassifier::classify(f64::NAN), AllocationState::Neutral);
    }
}
