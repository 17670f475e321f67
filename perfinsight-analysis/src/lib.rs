//! PerfInsight analysis engine
//!
//! Turns tabular performance-test results into a structured analysis:
//! - Record normalization from arbitrarily named columns
//! - Summary metrics, time-bucketed trends and z-score anomalies
//! - Rule-based findings, recommendations and risk areas
//! - Baseline vs candidate comparison with an overall verdict
//! - HTML, Markdown and JSON report rendering

pub mod normalizer;
pub mod metrics;
pub mod trend;
pub mod anomaly;
pub mod insights;
pub mod comparison;
pub mod analysis;
pub mod report;
pub mod utils;

pub use analysis::{Analysis, AnalysisEngine};
pub use anomaly::{Anomaly, AnomalyDetector, AnomalySet};
pub use comparison::{Comparison, ComparisonEngine, MetricDelta, Verdict};
pub use insights::{InsightSet, InsightSynthesizer, MetricStatus, Severity, StatusAssessment};
pub use metrics::{EndpointStats, ErrorStats, MetricsCalculator, MetricsSummary, ResponseTimeStats, ThroughputStats};
pub use normalizer::{DatasetSummary, DropReason, Normalized, RecordNormalizer, RowIssue, UNKNOWN_STATUS_CODE};
pub use report::{BuiltinRenderer, Report, ReportBody, ReportFormat, ReportRenderer};
pub use trend::{MetricTrend, TrendAnalyzer, TrendDirection, TrendResult};
