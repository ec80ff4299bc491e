//! Rolling-ROI degradation detection.

use std::collections::HashMap;

use crate::domain::id::StrategyId;
use crate::domain::performance::PerformanceRecord;

/// A strategy whose ROI fell at least the threshold below its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub strategy_id: StrategyId,
    pub baseline_roi: f64,
    pub current_roi: f64,
}

impl Degradation {
    #[must_use]
    pub fn drop_points(&self) -> f64 {
        self.baseline_roi - self.current_roi
    }
}

/// Compares fresh ROI against baselines captured at the last successful
/// refresh.
#[derive(Debug, Clone)]
pub struct DegradationDetector {
    threshold_points: f64,
    baselines: HashMap<StrategyId, f64>,
}

impl DegradationDetector {
    #[must_use]
    pub fn new(threshold_points: f64) -> Self {
        Self {
            threshold_points,
            baselines: HashMap::new(),
        }
    }

    /// Replace baselines with the ROI of each record.
    pub fn capture<'a>(&mut self, records: impl IntoIterator<Item = &'a PerformanceRecord>) {
        self.baselines = records
            .into_iter()
            .filter(|r| r.roi.is_finite())
            .map(|r| (r.strategy_id.clone(), r.roi))
            .collect();
    }

    /// Strategies that degraded, largest drop first. Strategies without a
    /// baseline are ignored.
    #[must_use]
    pub fn detect(&self, records: &[PerformanceRecord]) -> Vec<Degradation> {
        let mut found: Vec<Degradation> = records
            .iter()
            .filter(|r| r.roi.is_finite())
            .filter_map(|r| {
                let baseline = self.baselines.get(&r.strategy_id)?;
                (baseline - r.roi >= self.threshold_points).then(|| Degradation {
                    strategy_id: r.strategy_id.clone(),
                    baseline_roi: *baseline,
                    current_roi: r.roi,
                })
            })
            .collect();
        found.sort_by(|a, b| b.drop_points().total_cmp(&a.drop_points()));
        found
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(id: &str, roi: f64) -> PerformanceRecord {
        PerformanceRecord {
            strategy_id: StrategyId::new(id),
            win_rate: 0.5,
            roi,
            sample_size: 20,
            consecutive_losses: 0,
            observed_at: Utc::now(),
            source_partition: String::new(),
        }
    }

    #[test]
    fn detects_drop_of_at_least_threshold() {
        let mut detector = DegradationDetector::new(15.0);
        detector.capture(&[record("a", 12.0), record("b", 5.0)]);

        let found = detector.detect(&[record("a", -3.0), record("b", -5.0), record("c", -90.0)]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].strategy_id, StrategyId::new("a"));
        assert_eq!(found[0].drop_points(), 15.0);
    }
}
