use crate::domain::model::StatsSnapshot;

/// Best-effort numeric coercion of a raw field.
///
/// Surrounding whitespace is ignored. Empty strings, non-numeric text and
/// non-finite values (`NaN`, `inf`) are rejected.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Online count/sum/min/max accumulator for a single column.
///
/// Each value is consumed once; memory use does not depend on input size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw field. Values that do not coerce are ignored and `false`
    /// is returned.
    pub fn update(&mut self, raw: &str) -> bool {
        match coerce_number(raw) {
            Some(value) => {
                self.push(value);
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        if self.count == 0 {
            return StatsSnapshot {
                count: 0,
                sum: 0.0,
                mean: None,
                min: None,
                max: None,
            };
        }

        StatsSnapshot {
            count: self.count,
            sum: self.sum,
            mean: Some(self.sum / self.count as f64),
            min: Some(self.min),
            max: Some(self.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("79.84"), Some(79.84));
        assert_eq!(coerce_number("  4 "), Some(4.0));
        assert_eq!(coerce_number("-1e2"), Some(-100.0));
        assert_eq!(coerce_number(""), None);
        assert_eq!(coerce_number("N/A"), None);
        assert_eq!(coerce_number("NaN"), None);
        assert_eq!(coerce_number("inf"), None);
    }

    #[test]
    fn test_empty_snapshot_has_no_mean() {
        let stats = RunningStats::new();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.mean, None);
        assert_eq!(snapshot.min, None);
        assert_eq!(snapshot.max, None);
    }

    #[test]
    fn test_non_numeric_values_are_skipped() {
        let mut stats = RunningStats::new();
        let accepted: Vec<bool> = ["19.96", "?", "24.96", "", "0.39"]
            .iter()
            .map(|raw| stats.update(raw))
            .collect();

        assert_eq!(accepted, vec![true, false, true, false, true]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.sum - 45.31).abs() < 1e-9);
        assert!((snapshot.mean.unwrap() - 45.31 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.min, Some(0.39));
        assert_eq!(snapshot.max, Some(24.96));
    }

    #[test]
    fn test_min_max_are_monotonic() {
        let mut stats = RunningStats::new();
        let mut last_min = f64::INFINITY;
        let mut last_max = f64::NEG_INFINITY;

        for value in [5.0, 3.0, 8.0, 3.5, -2.0, 10.0, 0.0] {
            stats.push(value);
            let snapshot = stats.snapshot();
            assert!(snapshot.min.unwrap() <= last_min);
            assert!(snapshot.max.unwrap() >= last_max);
            last_min = snapshot.min.unwrap();
            last_max = snapshot.max.unwrap();
        }

        assert_eq!(last_min, -2.0);
        assert_eq!(last_max, 10.0);
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut stats = RunningStats::new();
        stats.push(1.5);
        stats.push(2.5);

        let first = stats.snapshot();
        let second = stats.snapshot();
        assert_eq!(first, second);
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.sum(), 4.0);
    }

    #[test]
    fn test_single_negative_value_sets_min_and_max() {
        let mut stats = RunningStats::new();
        stats.push(-7.25);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.min, Some(-7.25));
        assert_eq!(snapshot.max, Some(-7.25));
    }
}
