//! Default text explanations for sector results.
//!
//! Explanations describe where capital is flowing. They never recommend an
//! action.

use sector_alloc_core::{
    AllocationState, BaselineStatus, EntityId, ExplanationInput, Explainer, Feature,
};

/// Z-score magnitude beyond which a driver counts as elevated or depressed.
const DRIVER_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Elevated,
    Depressed,
    Neutral,
}

impl Direction {
    fn of(z: f64) -> Self {
        if z > DRIVER_THRESHOLD {
            Direction::Elevated
        } else if z < -DRIVER_THRESHOLD {
            Direction::Depressed
        } else {
            Direction::Neutral
        }
    }
}

/// Template-based [`Explainer`].
#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    benchmark: EntityId,
}

impl ExplanationGenerator {
    #[must_use]
    pub fn new(benchmark: EntityId) -> Self {
        Self { benchmark }
    }

    fn headline(&self, state: AllocationState) -> String {
        let b = &self.benchmark;
        match state {
            AllocationState::Overweight => format!(
                "Strong positive net inflows and sustained outperformance versus {b}."
            ),
            AllocationState::Accumulating => {
                "Net inflows accelerating with above-average relative performance.".to_string()
            }
            AllocationState::Neutral => {
                format!("Balanced capital flows and performance roughly in line with {b}.")
            }
            AllocationState::Decreasing => {
                "Net outflows building with below-average relative performance.".to_string()
            }
            AllocationState::Underweight => format!(
                "Significant net outflows and sustained underperformance versus {b}."
            ),
        }
    }

    fn driver(&self, feature: Feature, z: f64) -> String {
        let b = &self.benchmark;
        let phrase = match (feature, Direction::of(z)) {
            (Feature::AllocationPressure, Direction::Elevated) => {
                "Strong net capital inflows detected".to_string()
            }
            (Feature::AllocationPressure, Direction::Depressed) => {
                "Significant net capital outflows detected".to_string()
            }
            (Feature::AllocationPressure, Direction::Neutral) => {
                "Capital flows are balanced".to_string()
            }
            (Feature::RelativeStrength, Direction::Elevated) => {
                format!("Outperforming {b} on a relative basis")
            }
            (Feature::RelativeStrength, Direction::Depressed) => {
                format!("Underperforming {b} on a relative basis")
            }
            (Feature::RelativeStrength, Direction::Neutral) => {
                format!("Performance in line with {b}")
            }
        };
        format!("{phrase} ({z:+.2}\u{3c3})")
    }

    fn status_note(status: BaselineStatus) -> Option<&'static str> {
        match status {
            BaselineStatus::Complete => None,
            BaselineStatus::Partial => {
                Some("Some features excluded due to insufficient baseline history.")
            }
            BaselineStatus::Insufficient => Some("Insufficient data for reliable calculation."),
        }
    }

    /// One-line summary, e.g. `Technology (XLK): +1.38 (OVERWEIGHT)`.
    #[must_use]
    pub fn format_summary(
        name: &str,
        entity: &EntityId,
        state: AllocationState,
        score: f64,
    ) -> String {
        format!("{name} ({entity}): {score:+.2} ({state})")
    }
}

impl Explainer for ExplanationGenerator {
    fn explain(&self, input: &ExplanationInput<'_>) -> String {
        let mut parts = vec![self.headline(input.state)];

        let drivers: Vec<String> = input
            .z_scores
            .iter()
            .map(|(feature, z)| self.driver(*feature, *z))
            .collect();
        if !drivers.is_empty() {
            parts.push(format!("{}.", drivers.join("; ")));
        }

        if let Some(note) = Self::status_note(input.status) {
            parts.push(note.to_string());
        }

        if !input.excluded.is_empty() {
            let codes: Vec<&str> = input.excluded.iter().map(|f| f.code()).collect();
            parts.push(format!("Excluded: {}.", codes.join(", ")));
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn generator() -> ExplanationGenerator {
        ExplanationGenerator::new(EntityId::new("SPY"))
    }

    #[test]
    fn test_complete_explanation() {
        let entity = EntityId::new("XLK");
        let mut z = BTreeMap::new();
        z.insert(Feature::AllocationPressure, 1.5);
        z.insert(Feature::RelativeStrength, 1.2);

        let text = generator().explain(&ExplanationInput {
            entity: &entity,
            state: AllocationState::Overweight,
            z_scores: &z,
            excluded: &[],
            status: BaselineStatus::Complete,
        });

        assert!(text.starts_with("Strong positive net inflows"));
        assert!(text.contains("versus SPY"));
        assert!(text.contains("Strong net capital inflows detected (+1.50\u{3c3})"));
        assert!(text.contains("Outperforming SPY on a relative basis (+1.20\u{3c3})"));
        assert!(!text.contains("Excluded"));
    }

    #[test]
    fn test_partial_explanation_lists_exclusions() {
        let entity = EntityId::new("XLE");
        let mut z = BTreeMap::new();
        z.insert(Feature::RelativeStrength, -0.2);

        let text = generator().explain(&ExplanationInput {
            entity: &entity,
            state: AllocationState::Neutral,
            z_scores: &z,
            excluded: &[Feature::AllocationPressure],
            status: BaselineStatus::Partial,
        });

        assert!(text.contains("Performance in line with SPY (-0.20\u{3c3})"));
        assert!(text.contains("insufficient baseline history"));
        assert!(text.ends_with("Excluded: AP."));
    }

    #[test]
    fn test_insufficient_explanation() {
        let entity = EntityId::new("XLU");
        let z = BTreeMap::new();

        let text = generator().explain(&ExplanationInput {
            entity: &entity,
            state: AllocationState::Neutral,
            z_scores: &z,
            excluded: &Feature::ALL,
            status: BaselineStatus::Insufficient,
        });

        assert!(text.contains("Insufficient data"));
        assert!(text.ends_with("Excluded: AP, RS."));
    }

    #[test]
    fn test_driver_thresholds() {
        assert_eq!(Direction::of(0.5), Direction::Neutral);
        assert_eq!(Direction::of(0.51), Direction::Elevated);
        assert_eq!(Direction::of(-0.5), Direction::Neutral);
        assert_eq!(Direction::of(-0.51), Direction::Depressed);
    }

    #[test]
    fn test_format_summary() {
        let line = ExplanationGenerator::format_summary(
            "Technology",
            &EntityId::new("XLK"),
            AllocationState::Overweight,
            1.38,
        );
        assert_eq!(line, "Technology (XLK): +1.38 (OVERWEIGHT)");
    }
}
