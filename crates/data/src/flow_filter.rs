use chrono::NaiveDate;
use sector_alloc_core::EntityId;

/// Drops anomalous net-flow spikes before they reach the baselines.
///
/// A value is an outlier when its magnitude exceeds `multiple` times the
/// median magnitude of the series. Dropped days become missing; no proxy is
/// substituted for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowOutlierFilter {
    multiple: f64,
    min_points: usize,
}

impl Default for FlowOutlierFilter {
    fn default() -> Self {
        Self {
            multiple: 50.0,
            min_points: 5,
        }
    }
}

impl FlowOutlierFilter {
    #[must_use]
    pub fn new(multiple: f64, min_points: usize) -> Self {
        Self {
            multiple,
            min_points,
        }
    }

    /// Returns the series without its outliers, preserving order.
    ///
    /// Series shorter than `min_points`, or with a zero median magnitude, are
    /// returned unchanged.
    #[must_use]
    pub fn filter(&self, symbol: &EntityId, series: Vec<(NaiveDate, f64)>) -> Vec<(NaiveDate, f64)> {
        if series.len() < self.min_points {
            return series;
        }
        let Some(median) = median_abs(&series) else {
            return series;
        };
        if median == 0.0 {
            return series;
        }

        let threshold = self.multiple * median;
        let (kept, dropped): (Vec<_>, Vec<_>) = series
            .into_iter()
            .partition(|(_, value)| value.abs() <= threshold);

        if !dropped.is_empty() {
            let dates: Vec<String> = dropped.iter().map(|(d, _)| d.to_string()).collect();
            tracing::warn!(
                "Dropped {} flow outlier(s) for {} (>{}x median): {}",
                dropped.len(),
                symbol,
                self.multiple,
                dates.join(", ")
            );
        }

        kept
    }
}

fn median_abs(series: &[(NaiveDate, f64)]) -> Option<f64> {
    let mut magnitudes: Vec<f64> = series.iter().map(|(_, v)| v.abs()).collect();
    if magnitudes.is_empty() {
        return None;
    }
    magnitudes.sort_by(f64::total_cmp);
    let mid = magnitudes.len() / 2;
    if magnitudes.len() % 2 == 0 {
        Some((magnitudes[mid - 1] + magnitudes[mid]) / 2.0)
    } else {
        Some(magnitudes[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let day = u32::try_from(i).unwrap() + 1;
                (NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), *v)
            })
            .collect()
    }

    #[test]
    fn test_drops_spike() {
        let filter = FlowOutlierFilter::default();
        let input = series(&[10.0, -12.0, 8.0, 11.0, 9.0, 800.0 * 10.0]);

        let kept = filter.filter(&EntityId::new("XLF"), input);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|(_, v)| v.abs() < 100.0));
    }

    #[test]
    fn test_negative_spike_is_dropped_too() {
        let kept = FlowOutlierFilter::default()
            .filter(&EntityId::new("XLF"), series(&[1.0, 2.0, 1.0, 2.0, -1_000.0]));
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // median |v| = 2.0, so 100.0 sits exactly on the threshold
        let kept = FlowOutlierFilter::default()
            .filter(&EntityId::new("XLF"), series(&[2.0, 2.0, 2.0, 2.0, 100.0]));
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_short_series_unchanged() {
        let input = series(&[1.0, 1.0, 1.0, 10_000.0]);
        let kept = FlowOutlierFilter::default().filter(&EntityId::new("XLF"), input.clone());
        assert_eq!(kept, input);
    }

    #[test]
    fn test_zero_median_unchanged() {
        let input = series(&[0.0, 0.0, 0.0, 0.0, 0.0, 5.0]);
        let kept = FlowOutlierFilter::default().filter(&EntityId::new("XLF"), input.clone());
        assert_eq!(kept, input);
    }

    #[test]
    fn test_even_length_median() {
        let median = median_abs(&series(&[1.0, -3.0, 5.0, 7.0])).unwrap();
        assert_eq!(median, 4.0);
    }
}
