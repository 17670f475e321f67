//! Summary statistics over a record set
//!
//! Latency distribution, error accounting, throughput and the per-status
//! and per-endpoint breakdowns that reports are built from.

use crate::utils::{mean, percentage, percentile_linear, sample_std_dev, sorted};
use perfinsight_common::{InsightError, Observation, RecordSet, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Response time distribution in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl ResponseTimeStats {
    fn from_values(values: &[f64]) -> Self {
        let sorted = sorted(values);
        Self {
            mean: mean(values),
            p50: percentile_linear(&sorted, 50.0),
            p90: percentile_linear(&sorted, 90.0),
            p95: percentile_linear(&sorted, 95.0),
            p99: percentile_linear(&sorted, 99.0),
            min: sorted.first().copied().unwrap_or_default(),
            max: sorted.last().copied().unwrap_or_default(),
            std_dev: sample_std_dev(values),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub total_requests: usize,
    pub error_count: usize,
    /// Percentage of failed requests (0..=100)
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<f64>,
}

/// Statistics for a single endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub response_time: ResponseTimeStats,
    pub errors: ErrorStats,
    pub throughput: ThroughputStats,
    /// Request count per status code
    pub status_codes: BTreeMap<u16, usize>,
    pub endpoints: BTreeMap<String, EndpointStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_users: Option<usize>,
}

/// Computes [`MetricsSummary`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, records: &RecordSet) -> Result<MetricsSummary> {
        let observations = records.observations();
        if observations.is_empty() {
            return Err(InsightError::EmptyDataset(
                "cannot compute metrics without observations".to_string(),
            ));
        }

        let response_times = records.response_times();
        let total_requests = observations.len();
        let error_count = observations.iter().filter(|o| o.failed()).count();

        let mut status_codes = BTreeMap::new();
        for observation in observations {
            *status_codes.entry(observation.status_code).or_insert(0) += 1;
        }

        let summary = MetricsSummary {
            response_time: ResponseTimeStats::from_values(&response_times),
            errors: ErrorStats {
                total_requests,
                error_count,
                error_rate: percentage(error_count, total_requests),
            },
            throughput: ThroughputStats {
                requests_per_second: requests_per_second(records),
            },
            status_codes,
            endpoints: endpoint_stats(observations),
            unique_users: unique_users(observations),
        };

        debug!(
            "Calculated metrics over {} requests: mean {:.2}ms, p95 {:.2}ms, error rate {:.2}%",
            total_requests, summary.response_time.mean, summary.response_time.p95, summary.errors.error_rate
        );

        Ok(summary)
    }
}

fn requests_per_second(records: &RecordSet) -> Option<f64> {
    if records.synthetic_timestamps() {
        return None;
    }
    let (start, end) = records.time_range();
    let span_seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    if span_seconds > 0.0 {
        Some(records.len() as f64 / span_seconds)
    } else {
        None
    }
}

fn endpoint_stats(observations: &[Observation]) -> BTreeMap<String, EndpointStats> {
    let mut grouped: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for observation in observations {
        if let Some(endpoint) = observation.endpoint.as_deref() {
            grouped.entry(endpoint).or_default().push(observation);
        }
    }

    grouped
        .into_iter()
        .map(|(endpoint, group)| {
            let times: Vec<f64> = group.iter().map(|o| o.response_time).collect();
            let sorted = sorted(&times);
            let errors = group.iter().filter(|o| o.failed()).count();
            let stats = EndpointStats {
                count: group.len(),
                mean: mean(&times),
                min: sorted.first().copied().unwrap_or_default(),
                max: sorted.last().copied().unwrap_or_default(),
                p95: percentile_linear(&sorted, 95.0),
                error_rate: percentage(errors, group.len()),
            };
            (endpoint.to_string(), stats)
        })
        .collect()
}

fn unique_users(observations: &[Observation]) -> Option<usize> {
    let users: HashSet<&str> = observations.iter().filter_map(|o| o.user_id.as_deref()).collect();
    if users.is_empty() {
        None
    } else {
        Some(users.len())
    }
}
