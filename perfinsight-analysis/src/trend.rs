//! Time-bucketed trend analysis
//!
//! Observations are grouped into hourly and/or daily buckets. The direction
//! of a metric compares the mean of the first third of buckets with the mean
//! of the last third on the finest requested granularity.

use crate::utils::{mean, percentage};
use perfinsight_common::{Granularity, Observation, RecordSet, TrendConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Trend direction. For both tracked metrics a higher value is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Degrading,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Degrading => "degrading",
            TrendDirection::Stable => "stable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub direction: TrendDirection,
    /// Relative change in percent between the first and last third
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    /// Buckets on the granularity the direction was computed from
    pub bucket_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_pattern: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_pattern: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Mean response time per bucket (ms)
    pub response_time: MetricTrend,
    /// Error rate per bucket (%)
    pub error_rate: MetricTrend,
}

/// Key a timestamp into its bucket. Keys sort chronologically.
pub fn bucket_key(observation: &Observation, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => observation.timestamp.format("%Y-%m-%dT%H:00:00Z").to_string(),
        Granularity::Day => observation.timestamp.format("%Y-%m-%d").to_string(),
    }
}

/// Per-bucket aggregates for one granularity
struct Buckets {
    mean_response_time: BTreeMap<String, f64>,
    error_rate: BTreeMap<String, f64>,
}

impl Buckets {
    fn collect(records: &RecordSet, granularity: Granularity) -> Self {
        let mut grouped: BTreeMap<String, Vec<&Observation>> = BTreeMap::new();
        for observation in records {
            grouped
                .entry(bucket_key(observation, granularity))
                .or_default()
                .push(observation);
        }

        let mut mean_response_time = BTreeMap::new();
        let mut error_rate = BTreeMap::new();
        for (key, group) in grouped {
            let times: Vec<f64> = group.iter().map(|o| o.response_time).collect();
            let errors = group.iter().filter(|o| o.failed()).count();
            mean_response_time.insert(key.clone(), mean(&times));
            error_rate.insert(key, percentage(errors, group.len()));
        }

        Self {
            mean_response_time,
            error_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, records: &RecordSet) -> TrendResult {
        let mut granularities = if self.config.granularities.is_empty() {
            TrendConfig::default().granularities
        } else {
            self.config.granularities.clone()
        };
        granularities.sort();
        granularities.dedup();

        let by_granularity: BTreeMap<Granularity, Buckets> = granularities
            .iter()
            .map(|g| (*g, Buckets::collect(records, *g)))
            .collect();

        // Hour sorts before Day, so the first entry is the finest.
        let finest = by_granularity.values().next();
        let (rt_direction, rt_change, error_direction, error_change, bucket_count) = match finest {
            Some(buckets) => {
                let rt_values: Vec<f64> = buckets.mean_response_time.values().copied().collect();
                let error_values: Vec<f64> = buckets.error_rate.values().copied().collect();
                let (rt_direction, rt_change) = self.direction(&rt_values);
                let (error_direction, error_change) = self.direction(&error_values);
                (rt_direction, rt_change, error_direction, error_change, rt_values.len())
            }
            None => (TrendDirection::Stable, None, TrendDirection::Stable, None, 0),
        };

        let hour = by_granularity.get(&Granularity::Hour);
        let day = by_granularity.get(&Granularity::Day);

        let result = TrendResult {
            response_time: MetricTrend {
                direction: rt_direction,
                change_pct: rt_change,
                bucket_count,
                hourly_pattern: hour.map(|b| b.mean_response_time.clone()),
                daily_pattern: day.map(|b| b.mean_response_time.clone()),
            },
            error_rate: MetricTrend {
                direction: error_direction,
                change_pct: error_change,
                bucket_count,
                hourly_pattern: hour.map(|b| b.error_rate.clone()),
                daily_pattern: day.map(|b| b.error_rate.clone()),
            },
        };

        debug!(
            "Trend over {} buckets: response time {}, error rate {}",
            bucket_count, result.response_time.direction, result.error_rate.direction
        );

        result
    }

    /// Direction and percent change of a chronologically ordered series
    fn direction(&self, values: &[f64]) -> (TrendDirection, Option<f64>) {
        let third = values.len() / 3;
        if third == 0 {
            return (TrendDirection::Stable, Some(0.0));
        }

        let first = mean(&values[..third]);
        let last = mean(&values[values.len() - third..]);

        if first == 0.0 {
            return if last == 0.0 {
                (TrendDirection::Stable, Some(0.0))
            } else {
                (TrendDirection::Degrading, None)
            };
        }

        let change = (last - first) / first;
        let direction = if change > self.config.relative_threshold {
            TrendDirection::Degrading
        } else if change < -self.config.relative_threshold {
            TrendDirection::Improving
        } else {
            TrendDirection::Stable
        };

        (direction, Some(change * 100.0))
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}
