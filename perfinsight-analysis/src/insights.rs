//! Rule-based insight synthesis
//!
//! Turns metrics, trends and anomalies into ranked key findings,
//! recommendations and risk areas, and rates the run against the configured
//! warning and critical thresholds.

use crate::anomaly::AnomalySet;
use crate::metrics::MetricsSummary;
use crate::trend::{TrendDirection, TrendResult};
use crate::utils::format_millis;
use perfinsight_common::{InsightRules, ThresholdConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rule severity. Declaration order is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_areas: Vec<String>,
}

impl InsightSet {
    pub fn is_empty(&self) -> bool {
        self.key_findings.is_empty() && self.recommendations.is_empty() && self.risk_areas.is_empty()
    }
}

/// Threshold rating of a metric. Declaration order is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Ok,
    Warning,
    Critical,
}

impl std::fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MetricStatus::Ok => "ok",
            MetricStatus::Warning => "warning",
            MetricStatus::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAssessment {
    pub overall: MetricStatus,
    /// Rated on p95
    pub response_time: MetricStatus,
    pub error_rate: MetricStatus,
    /// Absent when requests per second could not be computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<MetricStatus>,
}

/// Outcome of one fired rule
struct RuleHit {
    severity: Severity,
    finding: Option<String>,
    recommendation: Option<String>,
    risk: Option<String>,
}

impl RuleHit {
    fn new(severity: Severity) -> Self {
        Self {
            severity,
            finding: None,
            recommendation: None,
            risk: None,
        }
    }

    fn finding(mut self, text: impl Into<String>) -> Self {
        self.finding = Some(text.into());
        self
    }

    fn recommendation(mut self, text: impl Into<String>) -> Self {
        self.recommendation = Some(text.into());
        self
    }

    fn risk(mut self, text: impl Into<String>) -> Self {
        self.risk = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsightSynthesizer {
    thresholds: ThresholdConfig,
    rules: InsightRules,
}

impl InsightSynthesizer {
    pub fn new(thresholds: ThresholdConfig, rules: InsightRules) -> Self {
        Self { thresholds, rules }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn synthesize(&self, metrics: &MetricsSummary, trends: &TrendResult, anomalies: &AnomalySet) -> InsightSet {
        let mut hits = self.evaluate(metrics, trends, anomalies);

        // Stable: rules of equal severity keep their evaluation order.
        hits.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut insights = InsightSet::default();
        for hit in hits {
            insights.key_findings.extend(hit.finding);
            insights.recommendations.extend(hit.recommendation);
            insights.risk_areas.extend(hit.risk);
        }

        debug!(
            "Synthesized {} findings, {} recommendations, {} risk areas",
            insights.key_findings.len(),
            insights.recommendations.len(),
            insights.risk_areas.len()
        );

        insights
    }

    pub fn assess(&self, metrics: &MetricsSummary) -> StatusAssessment {
        let t = &self.thresholds;
        let response_time = rate(
            metrics.response_time.p95,
            t.warning_response_time_ms,
            t.critical_response_time_ms,
        );
        let error_rate = rate(metrics.errors.error_rate, t.warning_error_rate_pct, t.critical_error_rate_pct);
        let throughput = metrics.throughput.requests_per_second.map(|rps| {
            rate_floor(rps, self.rules.warning_throughput_rps, self.rules.critical_throughput_rps)
        });

        StatusAssessment {
            overall: response_time.max(error_rate).max(throughput.unwrap_or(MetricStatus::Ok)),
            response_time,
            error_rate,
            throughput,
        }
    }

    fn evaluate(&self, metrics: &MetricsSummary, trends: &TrendResult, anomalies: &AnomalySet) -> Vec<RuleHit> {
        let t = &self.thresholds;
        let rt = &metrics.response_time;
        let error_rate = metrics.errors.error_rate;
        let mut hits = Vec::new();

        if error_rate > t.critical_error_rate_pct {
            hits.push(
                RuleHit::new(Severity::High)
                    .finding(format!(
                        "Error rate of {:.2}% exceeds the critical threshold of {:.2}%",
                        error_rate, t.critical_error_rate_pct
                    ))
                    .recommendation("Investigate and fix the causes of failing requests before the next release")
                    .risk("High error rate detected"),
            );
        } else if error_rate > t.warning_error_rate_pct {
            hits.push(
                RuleHit::new(Severity::Medium)
                    .finding(format!(
                        "Error rate of {:.2}% exceeds the warning threshold of {:.2}%",
                        error_rate, t.warning_error_rate_pct
                    ))
                    .recommendation("Review failing requests and their status codes"),
            );
        }

        if rt.p95 > t.critical_response_time_ms {
            hits.push(
                RuleHit::new(Severity::High)
                    .finding(format!(
                        "95th percentile response time of {} exceeds the critical threshold of {}",
                        format_millis(rt.p95),
                        format_millis(t.critical_response_time_ms)
                    ))
                    .recommendation("Profile the slowest endpoints and address the bottleneck")
                    .risk("Tail latency is above the critical threshold"),
            );
        } else if rt.p95 > t.warning_response_time_ms {
            hits.push(
                RuleHit::new(Severity::Medium)
                    .finding(format!(
                        "95th percentile response time of {} exceeds the warning threshold of {}",
                        format_millis(rt.p95),
                        format_millis(t.warning_response_time_ms)
                    ))
                    .recommendation("Consider performance optimization of the slowest requests"),
            );
        }

        if let Some(rps) = metrics.throughput.requests_per_second {
            let rules = &self.rules;
            if rps < rules.critical_throughput_rps {
                hits.push(
                    RuleHit::new(Severity::High)
                        .finding(format!(
                            "Throughput of {:.2} req/s is below the critical threshold of {:.2} req/s",
                            rps, rules.critical_throughput_rps
                        ))
                        .recommendation("Check load generator capacity and server-side saturation")
                        .risk("Throughput is below the critical threshold"),
                );
            } else if rps < rules.warning_throughput_rps {
                hits.push(
                    RuleHit::new(Severity::Medium)
                        .finding(format!(
                            "Throughput of {:.2} req/s is below the warning threshold of {:.2} req/s",
                            rps, rules.warning_throughput_rps
                        ))
                        .recommendation("Review concurrency settings and connection pool sizes"),
                );
            }
        }

        if trends.response_time.direction == TrendDirection::Degrading {
            let detail = trends
                .response_time
                .change_pct
                .map(|pct| format!(" ({:+.1}%)", pct))
                .unwrap_or_default();
            hits.push(
                RuleHit::new(Severity::Medium)
                    .finding(format!("Response time is increasing over the test{}", detail))
                    .recommendation("Check for resource exhaustion or contention as load is sustained"),
            );
        }

        if trends.error_rate.direction == TrendDirection::Degrading {
            hits.push(
                RuleHit::new(Severity::Medium)
                    .finding("Error rate is increasing over the test")
                    .recommendation("Correlate rising errors with load and downstream dependencies")
                    .risk("Error rate trend is degrading"),
            );
        }

        if rt.mean > t.warning_response_time_ms {
            hits.push(RuleHit::new(Severity::Medium).risk(format!(
                "Average response time of {} exceeds {}",
                format_millis(rt.mean),
                format_millis(t.warning_response_time_ms)
            )));
        }

        if anomalies.anomaly_percentage > self.rules.anomaly_risk_pct {
            hits.push(
                RuleHit::new(Severity::Low)
                    .finding(format!(
                        "{:.1}% of requests are response time anomalies",
                        anomalies.anomaly_percentage
                    ))
                    .risk("Frequent response time anomalies"),
            );
        }

        if rt.p95 > self.rules.variability_ratio * rt.mean {
            hits.push(
                RuleHit::new(Severity::Low)
                    .finding("High response time variability detected")
                    .recommendation("Investigate causes of response time spikes"),
            );
        }

        hits
    }
}

fn rate(value: f64, warning: f64, critical: f64) -> MetricStatus {
    if value > critical {
        MetricStatus::Critical
    } else if value > warning {
        MetricStatus::Warning
    } else {
        MetricStatus::Ok
    }
}

/// Rating for a metric where lower values are worse
fn rate_floor(value: f64, warning: f64, critical: f64) -> MetricStatus {
    if value < critical {
        MetricStatus::Critical
    } else if value < warning {
        MetricStatus::Warning
    } else {
        MetricStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ErrorStats, ResponseTimeStats, ThroughputStats};
    use crate::trend::MetricTrend;
    use std::collections::BTreeMap;

    fn metrics(mean: f64, p95: f64, error_rate: f64) -> MetricsSummary {
        MetricsSummary {
            response_time: ResponseTimeStats {
                mean,
                p50: mean,
                p90: p95,
                p95,
                p99: p95,
                min: 0.0,
                max: p95,
                std_dev: 0.0,
            },
            errors: ErrorStats {
                total_requests: 100,
                error_count: error_rate as usize,
                error_rate,
            },
            throughput: ThroughputStats::default(),
            status_codes: BTreeMap::new(),
            endpoints: BTreeMap::new(),
            unique_users: None,
        }
    }

    fn trend(direction: TrendDirection) -> MetricTrend {
        MetricTrend {
            direction,
            change_pct: Some(0.0),
            bucket_count: 3,
            hourly_pattern: None,
            daily_pattern: None,
        }
    }

    fn trends(rt: TrendDirection, errors: TrendDirection) -> TrendResult {
        TrendResult {
            response_time: trend(rt),
            error_rate: trend(errors),
        }
    }

    fn anomalies(percentage: f64) -> AnomalySet {
        AnomalySet {
            anomaly_count: percentage as usize,
            anomaly_percentage: percentage,
            anomaly_indices: Vec::new(),
            method: "zscore".to_string(),
            k: 2.0,
            lower_bound: None,
            upper_bound: None,
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn test_healthy_run_has_no_insights() {
        let synthesizer = InsightSynthesizer::default();
        let insights = synthesizer.synthesize(
            &metrics(100.0, 150.0, 0.0),
            &trends(TrendDirection::Stable, TrendDirection::Stable),
            &anomalies(0.0),
        );
        assert!(insights.is_empty());
        assert_eq!(synthesizer.assess(&metrics(100.0, 150.0, 0.0)).overall, MetricStatus::Ok);
    }

    #[test]
    fn test_critical_error_rate_ranks_first() {
        let insights = InsightSynthesizer::default().synthesize(
            &metrics(100.0, 400.0, 12.0),
            &trends(TrendDirection::Stable, TrendDirection::Stable),
            &anomalies(0.0),
        );
        // variability (low) fires too: 400 > 3 * 100
        assert_eq!(insights.key_findings.len(), 2);
        assert!(insights.key_findings[0].contains("critical threshold"));
        assert_eq!(insights.key_findings[1], "High response time variability detected");
        assert_eq!(insights.risk_areas, vec!["High error rate detected".to_string()]);
    }

    #[test]
    fn test_severity_ordering_overrides_rule_order() {
        let insights = InsightSynthesizer::default().synthesize(
            &metrics(1200.0, 3500.0, 6.0),
            &trends(TrendDirection::Degrading, TrendDirection::Stable),
            &anomalies(8.0),
        );

        assert_eq!(insights.key_findings.len(), 4);
        assert!(insights.key_findings[0].starts_with("95th percentile"));
        assert!(insights.key_findings[0].contains("critical"));
        assert!(insights.key_findings[1].starts_with("Error rate of 6.00%"));
        assert!(insights.key_findings[2].starts_with("Response time is increasing"));
        assert!(insights.key_findings[3].contains("anomalies"));

        assert_eq!(insights.risk_areas.len(), 3);
        assert_eq!(insights.risk_areas[2], "Frequent response time anomalies");
    }

    #[test]
    fn test_thresholds_are_strict() {
        let synthesizer = InsightSynthesizer::default();
        let at_limit = metrics(1000.0, 1000.0, 5.0);
        let insights = synthesizer.synthesize(
            &at_limit,
            &trends(TrendDirection::Stable, TrendDirection::Stable),
            &anomalies(5.0),
        );
        assert!(insights.is_empty());

        let status = synthesizer.assess(&at_limit);
        assert_eq!(status.response_time, MetricStatus::Ok);
        assert_eq!(status.error_rate, MetricStatus::Ok);
    }

    #[test]
    fn test_error_trend_is_a_risk() {
        let insights = InsightSynthesizer::default().synthesize(
            &metrics(100.0, 120.0, 1.0),
            &trends(TrendDirection::Improving, TrendDirection::Degrading),
            &anomalies(0.0),
        );
        assert_eq!(insights.risk_areas, vec!["Error rate trend is degrading".to_string()]);
        assert_eq!(insights.recommendations.len(), 1);
    }

    #[test]
    fn test_assessment_uses_worst_metric() {
        let synthesizer = InsightSynthesizer::new(ThresholdConfig::production(), InsightRules::default());
        let status = synthesizer.assess(&metrics(500.0, 900.0, 8.0));
        assert_eq!(status.response_time, MetricStatus::Warning);
        assert_eq!(status.error_rate, MetricStatus::Critical);
        assert_eq!(status.overall, MetricStatus::Critical);
        assert_eq!(status.throughput, None);
    }

    fn with_rps(mut summary: MetricsSummary, rps: f64) -> MetricsSummary {
        summary.throughput.requests_per_second = Some(rps);
        summary
    }

    #[test]
    fn test_low_throughput_is_rated_and_reported() {
        let synthesizer = InsightSynthesizer::default();
        let stable = trends(TrendDirection::Stable, TrendDirection::Stable);

        let slow = with_rps(metrics(100.0, 150.0, 0.0), 30.0);
        let status = synthesizer.assess(&slow);
        assert_eq!(status.throughput, Some(MetricStatus::Critical));
        assert_eq!(status.overall, MetricStatus::Critical);
        let insights = synthesizer.synthesize(&slow, &stable, &anomalies(0.0));
        assert!(insights.key_findings[0].starts_with("Throughput of 30.00 req/s is below the critical"));
        assert_eq!(insights.risk_areas, vec!["Throughput is below the critical threshold".to_string()]);

        let modest = with_rps(metrics(100.0, 150.0, 0.0), 80.0);
        assert_eq!(synthesizer.assess(&modest).throughput, Some(MetricStatus::Warning));
        let insights = synthesizer.synthesize(&modest, &stable, &anomalies(0.0));
        assert!(insights.key_findings[0].contains("warning threshold of 100.00 req/s"));
        assert!(insights.risk_areas.is_empty());
    }

    #[test]
    fn test_throughput_floors_are_strict() {
        let synthesizer = InsightSynthesizer::default();
        let at_floor = with_rps(metrics(100.0, 150.0, 0.0), 100.0);
        assert_eq!(synthesizer.assess(&at_floor).throughput, Some(MetricStatus::Ok));
        assert_eq!(synthesizer.assess(&at_floor).overall, MetricStatus::Ok);
        assert!(synthesizer
            .synthesize(&at_floor, &trends(TrendDirection::Stable, TrendDirection::Stable), &anomalies(0.0))
            .is_empty());

        let production = InsightSynthesizer::new(ThresholdConfig::production(), InsightRules::production());
        assert_eq!(production.assess(&at_floor).throughput, Some(MetricStatus::Warning));
    }
}
