//! Release-over-release growth.

use std::fmt;
use std::iter;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::summary::{Metric, MetricValue, ReleaseSummary, round_to};

/// Decimal places of percent growth.
pub const PERCENT_PRECISION: u32 = 2;

/// Decimal places of absolute growth of ratio metrics.
pub const DELTA_PRECISION: u32 = 4;

/// Absolute change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricDelta {
    /// Exact change of a count.
    Count(i64),
    /// Change of a ratio, rounded to [`DELTA_PRECISION`] decimals.
    Ratio(f64),
}

impl fmt::Display for MetricDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricDelta::Count(v) => fmt::Display::fmt(v, f),
            MetricDelta::Ratio(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// Absolute and percent change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricGrowth {
    /// `current - previous`, undefined for the first release.
    pub absolute: Option<MetricDelta>,
    /// `(current - previous) / previous * 100`, undefined when
    /// `previous == 0` or for the first release.
    pub percent: Option<f64>,
}

/// Growth of every metric of one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGrowth {
    /// Release the deltas were measured against.
    pub previous: Option<String>,
    /// Per-metric growth in column order.
    pub values: IndexMap<Metric, MetricGrowth>,
}

impl ReleaseGrowth {
    /// Growth of a release without predecessor: every value undefined.
    pub fn undefined() -> Self {
        Self {
            previous: None,
            values: Metric::all().map(|m| (m, MetricGrowth::default())).collect(),
        }
    }

    /// Growth of one metric.
    pub fn get(&self, metric: Metric) -> MetricGrowth {
        self.values.get(&metric).copied().unwrap_or_default()
    }
}

/// Percent change, rounded to two decimals. `None` when `previous == 0`.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(round_to((current - previous) / previous * 100.0, PERCENT_PRECISION))
}

/// Computes growth columns over releases in their final order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrowthCalculator;

impl GrowthCalculator {
    /// Create a new calculator.
    pub fn new() -> Self {
        Self
    }

    /// Growth of `current` relative to `previous`.
    pub fn between(&self, previous: &ReleaseSummary, current: &ReleaseSummary) -> ReleaseGrowth {
        let values = Metric::all()
            .map(|metric| {
                let growth = metric_growth(previous.value(metric), current.value(metric));
                (metric, growth)
            })
            .collect();
        ReleaseGrowth {
            previous: Some(previous.release.clone()),
            values,
        }
    }

    /// Set the growth of every summary.
    ///
    /// `summaries` must already be in release order; the first one receives
    /// an all-undefined growth record.
    pub fn apply(&self, summaries: &mut [ReleaseSummary]) {
        let growths: Vec<ReleaseGrowth> = iter::once(ReleaseGrowth::undefined())
            .chain(
                summaries
                    .iter()
                    .tuple_windows()
                    .map(|(prev, cur)| self.between(prev, cur)),
            )
            .collect();

        for (summary, growth) in summaries.iter_mut().zip(growths) {
            summary.growth = Some(growth);
        }
    }
}

fn metric_growth(previous: MetricValue, current: MetricValue) -> MetricGrowth {
    let absolute = match (previous, current) {
        (MetricValue::Count(p), MetricValue::Count(c)) => {
            Some(MetricDelta::Count(c as i64 - p as i64))
        }
        _ => match (previous.as_f64(), current.as_f64()) {
            (Some(p), Some(c)) => Some(MetricDelta::Ratio(round_to(c - p, DELTA_PRECISION))),
            _ => None,
        },
    };
    let percent = match (previous.as_f64(), current.as_f64()) {
        (Some(p), Some(c)) => percent_change(p, c),
        _ => None,
    };
    MetricGrowth { absolute, percent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn summary(release: &str, num_files: u64, size_bytes: u64) -> ReleaseSummary {
        let mut s = ReleaseSummary::empty(release, SystemTime::UNIX_EPOCH);
        s.num_files = num_files;
        s.size_bytes = size_bytes;
        s
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(3.0, 5.0), Some(66.67));
        assert_eq!(percent_change(600.0, 900.0), Some(50.0));
        assert_eq!(percent_change(4.0, 2.0), Some(-50.0));
        assert_eq!(percent_change(0.0, 5.0), None);
    }

    #[test]
    fn test_first_release_is_undefined() {
        let mut rows = vec![summary("1.0", 3, 600), summary("2.0", 5, 900)];
        GrowthCalculator::new().apply(&mut rows);

        let first = rows[0].growth.as_ref().unwrap();
        assert!(first.previous.is_none());
        assert!(first.values.values().all(|g| g.absolute.is_none() && g.percent.is_none()));

        let second = rows[1].growth.as_ref().unwrap();
        assert_eq!(second.previous.as_deref(), Some("1.0"));
        let files = second.get(Metric::NumFiles);
        assert_eq!(files.absolute, Some(MetricDelta::Count(2)));
        assert_eq!(files.percent, Some(66.67));
        assert_eq!(second.get(Metric::SizeBytes).percent, Some(50.0));
    }

    #[test]
    fn test_zero_previous_is_undefined_not_zero() {
        let mut rows = vec![summary("1.0", 0, 0), summary("2.0", 4, 10)];
        GrowthCalculator::new().apply(&mut rows);

        let growth = rows[1].growth.as_ref().unwrap().get(Metric::NumFiles);
        assert_eq!(growth.absolute, Some(MetricDelta::Count(4)));
        assert_eq!(growth.percent, None);
    }

    #[test]
    fn test_undefined_metric_propagates() {
        let mut a = summary("1.0", 1, 1);
        let mut b = summary("2.0", 1, 1);
        a.tree_size = None;
        b.tree_size = Some(2.0);
        let growth = GrowthCalculator::new().between(&a, &b).get(Metric::TreeSize);
        assert_eq!(growth, MetricGrowth::default());
    }

    #[test]
    fn test_ratio_delta_precision() {
        let mut a = summary("1.0", 1, 1);
        let mut b = summary("2.0", 1, 1);
        a.avg_file_size_bytes = 0.1;
        b.avg_file_size_bytes = 0.3;
        let growth = GrowthCalculator::new().between(&a, &b).get(Metric::AvgFileSizeBytes);
        assert_eq!(growth.absolute, Some(MetricDelta::Ratio(0.2)));
        assert_eq!(growth.percent, Some(200.0));
        assert_eq!(format!("{:+}", MetricDelta::Count(2)), "+2");
        assert_eq!(MetricDelta::Ratio(-0.5).to_string(), "-0.5");
    }
}
