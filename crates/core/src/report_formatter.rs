#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use crate::types::{DailyResult, Feature, Universe};

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(result: &DailyResult, universe: &Universe) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("════════════════════════════════════════════════════════════════════════\n");
        output.push_str("                      SECTOR ALLOCATION DIAGNOSTIC                      \n");
        output.push_str("════════════════════════════════════════════════════════════════════════\n");
        output.push_str(&format!("Date:       {}\n", result.date().format("%Y-%m-%d")));
        output.push_str(&format!("Benchmark:  {}\n", universe.benchmark()));
        output.push_str(&format!("Status:     {}\n", result.status()));
        output.push_str("────────────────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "{:<6} {:<25} {:>7} {:<14} {:>7} {:>7}\n",
            "Entity", "Name", "Score", "State", "AP(z)", "RS(z)"
        ));
        output.push_str("────────────────────────────────────────────────────────────────────────\n");

        for sector in result.sectors() {
            output.push_str(&format!(
                "{:<6} {:<25} {:>+7.2} {:<14} {:>7} {:>7}\n",
                sector.entity().as_str(),
                universe.display_name(sector.entity()),
                sector.composite_score(),
                sector.state().as_str(),
                Self::format_z(sector.z_score(Feature::AllocationPressure)),
                Self::format_z(sector.z_score(Feature::RelativeStrength)),
            ));
        }

        output.push_str("════════════════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("State Distribution\n");
        output.push_str("────────────────────────────────────────────────────────────────────────\n");
        for (state, count) in result.state_counts() {
            if count > 0 {
                output.push_str(&format!("  {:<14} {}\n", state.as_str(), count));
            }
        }

        if result.sectors().is_empty() {
            output.push_str("\n⚠️  No entities were scored for this date.\n");
            output.push_str("    Check that benchmark price data is available.\n");
        }
        output.push('\n');

        output
    }

    /// Formats an optional z-score for a table cell.
    #[must_use]
    pub fn format_z(z: Option<f64>) -> String {
        match z {
            Some(z) => format!("{:+.2}", z),
            None => "n/a".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UniverseConfig;
    use crate::types::{
        AllocationState, BaselineStatus, EntityId, RawFeatures, SectorResult,
    };
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_includes_rows_and_distribution() {
        let universe = Universe::from_config(&UniverseConfig::default());
        let mut z = BTreeMap::new();
        z.insert(Feature::AllocationPressure, 1.5);
        z.insert(Feature::RelativeStrength, 1.2);
        let sector = SectorResult::new(
            EntityId::new("XLK"),
            1.38,
            AllocationState::Overweight,
            String::new(),
            z,
            RawFeatures::default(),
            BaselineStatus::Complete,
        );
        let result = DailyResult::new(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(), vec![sector]);

        let text = ReportFormatter::format(&result, &universe);
        assert!(text.contains("Technology"));
        assert!(text.contains("+1.38"));
        assert!(text.contains("OVERWEIGHT"));
        assert!(text.contains("2024-06-14"));
    }

    #[test]
    fn test_missing_z_renders_as_na() {
        assert_eq!(ReportFormatter::format_z(None), "n/a");
        assert_eq!(ReportFormatter::format_z(Some(-0.5)), "-0.50");
    }

    #[test]
    fn test_empty_result_warns() {
        let universe = Universe::from_config(&UniverseConfig::default());
        let result = DailyResult::new(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(), Vec::new());
        let text = ReportFormatter::format(&result, &universe);
        assert!(text.contains("INSUFFICIENT"));
        assert!(text.contains("No entities were scored"));
    }
}
