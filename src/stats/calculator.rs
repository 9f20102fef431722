//! Statistics Calculator Module
//! Descriptive statistics and rankings over the derived growth metrics.

use crate::data::{CityRecord, GrowthMetric, UrbanTable};
use std::cmp::Ordering;

/// Summary of one metric across all cities.
#[derive(Debug, Clone)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p01: f64,
    pub p95: f64,
}

impl Default for MetricSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p01: f64::NAN,
            p95: f64::NAN,
        }
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Summarize the finite values of a slice.
    pub fn summarize(values: &[f64]) -> MetricSummary {
        let sorted = Self::sorted_finite(values);
        let n = sorted.len();
        if n == 0 {
            return MetricSummary::default();
        }

        let mean = sorted.iter().sum::<f64>() / n as f64;

        MetricSummary {
            count: n,
            mean,
            median: Self::percentile(&sorted, 50.0),
            min: sorted[0],
            max: sorted[n - 1],
            p01: Self::percentile(&sorted, 1.0),
            p95: Self::percentile(&sorted, 95.0),
        }
    }

    pub fn summarize_metric(table: &UrbanTable, metric: GrowthMetric) -> MetricSummary {
        let values: Vec<f64> = table
            .records()
            .iter()
            .filter_map(|r| metric.value(r))
            .collect();
        Self::summarize(&values)
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Percentile of unsorted values, ignoring NaN and infinities.
    pub fn percentile_of(values: &[f64], p: f64) -> f64 {
        Self::percentile(&Self::sorted_finite(values), p)
    }

    /// The `n` cities with the largest value of `metric`, largest first.
    /// Cities without a value for the metric are skipped.
    pub fn top_by(table: &UrbanTable, metric: GrowthMetric, n: usize) -> Vec<&CityRecord> {
        let mut ranked: Vec<(&CityRecord, f64)> = table
            .records()
            .iter()
            .filter_map(|r| metric.value(r).map(|v| (r, v)))
            .collect();
        // Stable sort keeps file order among ties
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.into_iter().take(n).map(|(r, _)| r).collect()
    }

    fn sorted_finite(values: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        sorted
    }
}
