//! Baseline vs candidate comparison
//!
//! Computes per-metric deltas between two analyses and classifies the
//! candidate as improved, regressed or unchanged.

use crate::analysis::Analysis;
use crate::utils::format_millis;
use indexmap::IndexMap;
use perfinsight_common::{ComparisonConfig, InsightError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const P95_KEY: &str = "response_time.p95";
pub const ERROR_RATE_KEY: &str = "errors.error_rate";

/// Change of one metric between baseline and candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub baseline: f64,
    pub candidate: f64,
    /// `candidate - baseline`
    pub delta: f64,
    /// Absent when the baseline is zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
}

impl MetricDelta {
    pub fn between(baseline: f64, candidate: f64) -> Self {
        let delta = candidate - baseline;
        Self {
            baseline,
            candidate,
            delta,
            percent_change: if baseline == 0.0 {
                None
            } else {
                Some(delta / baseline * 100.0)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Improved,
    Regressed,
    Unchanged,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Improved => "improved",
            Verdict::Regressed => "regressed",
            Verdict::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: Analysis,
    pub candidate: Analysis,
    /// Metric key -> delta, in a fixed order
    pub deltas: IndexMap<String, MetricDelta>,
    pub verdict: Verdict,
    pub verdict_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    config: ComparisonConfig,
}

impl ComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self { config }
    }

    pub fn compare(&self, baseline: &Analysis, candidate: &Analysis) -> Result<Comparison> {
        for (side, analysis) in [("baseline", baseline), ("candidate", candidate)] {
            if analysis.metrics.errors.total_requests == 0 {
                return Err(InsightError::Incomparable(format!(
                    "the {} analysis contains no requests",
                    side
                )));
            }
        }

        let deltas = compute_deltas(baseline, candidate);
        let (verdict, verdict_reasons) = self.classify(&deltas);

        info!(
            "Comparison verdict: {} ({})",
            verdict,
            verdict_reasons.join("; ")
        );

        Ok(Comparison {
            baseline: baseline.clone(),
            candidate: candidate.clone(),
            deltas,
            verdict,
            verdict_reasons,
        })
    }

    fn classify(&self, deltas: &IndexMap<String, MetricDelta>) -> (Verdict, Vec<String>) {
        let threshold_pct = self.config.p95_regression_pct;
        let threshold_pp = self.config.error_rate_regression_pp;
        let mut regressions = Vec::new();
        let mut improvements = Vec::new();

        if let Some(p95) = deltas.get(P95_KEY) {
            if let Some(pct) = p95.percent_change {
                let detail = format!(
                    "{:.1}% ({} -> {})",
                    pct.abs(),
                    format_millis(p95.baseline),
                    format_millis(p95.candidate)
                );
                if pct > threshold_pct {
                    regressions.push(format!(
                        "p95 response time increased by {}, above the {}% threshold",
                        detail, threshold_pct
                    ));
                } else if pct < -threshold_pct {
                    improvements.push(format!(
                        "p95 response time decreased by {}, beyond the {}% threshold",
                        detail, threshold_pct
                    ));
                }
            }
        }

        if let Some(errors) = deltas.get(ERROR_RATE_KEY) {
            let detail = format!(
                "{:.2} percentage points ({:.2}% -> {:.2}%)",
                errors.delta.abs(),
                errors.baseline,
                errors.candidate
            );
            if errors.delta > threshold_pp {
                regressions.push(format!(
                    "Error rate increased by {}, above the {} point threshold",
                    detail, threshold_pp
                ));
            } else if errors.delta < -threshold_pp {
                improvements.push(format!(
                    "Error rate decreased by {}, beyond the {} point threshold",
                    detail, threshold_pp
                ));
            }
        }

        if !regressions.is_empty() {
            regressions.extend(improvements);
            (Verdict::Regressed, regressions)
        } else if !improvements.is_empty() {
            (Verdict::Improved, improvements)
        } else {
            (
                Verdict::Unchanged,
                vec![format!(
                    "No change crossed the p95 ({}%) or error rate ({} point) thresholds",
                    threshold_pct, threshold_pp
                )],
            )
        }
    }
}

fn compute_deltas(baseline: &Analysis, candidate: &Analysis) -> IndexMap<String, MetricDelta> {
    let (b, c) = (&baseline.metrics, &candidate.metrics);
    let mut deltas = IndexMap::new();
    let mut push = |key: &str, from: f64, to: f64| {
        deltas.insert(key.to_string(), MetricDelta::between(from, to));
    };

    push("response_time.mean", b.response_time.mean, c.response_time.mean);
    push("response_time.p50", b.response_time.p50, c.response_time.p50);
    push("response_time.p90", b.response_time.p90, c.response_time.p90);
    push(P95_KEY, b.response_time.p95, c.response_time.p95);
    push("response_time.p99", b.response_time.p99, c.response_time.p99);
    push("response_time.min", b.response_time.min, c.response_time.min);
    push("response_time.max", b.response_time.max, c.response_time.max);
    push(ERROR_RATE_KEY, b.errors.error_rate, c.errors.error_rate);
    push("errors.error_count", b.errors.error_count as f64, c.errors.error_count as f64);
    push(
        "errors.total_requests",
        b.errors.total_requests as f64,
        c.errors.total_requests as f64,
    );
    push(
        "anomalies.anomaly_percentage",
        baseline.anomalies.anomaly_percentage,
        candidate.anomalies.anomaly_percentage,
    );
    if let (Some(from), Some(to)) = (b.throughput.requests_per_second, c.throughput.requests_per_second) {
        push("throughput.requests_per_second", from, to);
    }

    deltas
}
