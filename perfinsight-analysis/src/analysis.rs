//! Analysis pipeline
//!
//! Wires the normalizer, metrics calculator, trend analyzer, anomaly
//! detector and insight synthesizer into a single pass that either yields a
//! complete [`Analysis`] or an error.

use crate::anomaly::{AnomalyDetector, AnomalySet};
use crate::comparison::{Comparison, ComparisonEngine};
use crate::insights::{InsightSet, InsightSynthesizer, StatusAssessment};
use crate::metrics::{MetricsCalculator, MetricsSummary};
use crate::normalizer::{DatasetSummary, RecordNormalizer};
use crate::trend::{TrendAnalyzer, TrendResult};
use perfinsight_common::{AnalysisConfig, RawTable, RecordFilter, RecordSet, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Complete analysis of one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub dataset: DatasetSummary,
    pub metrics: MetricsSummary,
    pub trends: TrendResult,
    pub anomalies: AnomalySet,
    pub insights: InsightSet,
    pub status: StatusAssessment,
}

/// Runs the analysis pipeline with one configuration
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
    normalizer: RecordNormalizer,
    metrics: MetricsCalculator,
    anomalies: AnomalyDetector,
    insights: InsightSynthesizer,
    comparison: ComparisonEngine,
}

impl AnalysisEngine {
    /// Build an engine after validating `config`.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalysisConfig) -> Self {
        Self {
            normalizer: RecordNormalizer::new(config.normalizer.clone()),
            metrics: MetricsCalculator::new(),
            anomalies: AnomalyDetector::new(config.anomaly),
            insights: InsightSynthesizer::new(config.thresholds, config.insights),
            comparison: ComparisonEngine::new(config.comparison),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalize and analyze an uploaded table.
    pub fn analyze_table(&self, table: &RawTable) -> Result<Analysis> {
        let normalized = self.normalizer.normalize(table)?;
        self.run(&normalized.records, normalized.summary)
    }

    /// Normalize a table, keep only the observations matching `filter`, and
    /// analyze the remainder.
    pub fn analyze_filtered(&self, table: &RawTable, filter: &RecordFilter) -> Result<Analysis> {
        let normalized = self.normalizer.normalize(table)?;
        if filter.is_empty() {
            return self.run(&normalized.records, normalized.summary);
        }

        let records = normalized.records.filter(filter)?;
        debug!(
            "Filter kept {} of {} observations",
            records.len(),
            normalized.records.len()
        );

        // total_rows = dropped_rows + filtered_rows + analyzed observations
        let mut summary = DatasetSummary::from_records(&records);
        summary.total_rows = normalized.summary.total_rows;
        summary.dropped_rows = normalized.summary.dropped_rows;
        summary.filtered_rows = normalized.records.len() - records.len();
        summary.drop_reasons = normalized.summary.drop_reasons;
        summary.row_issues = normalized.summary.row_issues;
        summary.resolved_columns = normalized.summary.resolved_columns;
        self.run(&records, summary)
    }

    /// Analyze an already normalized record set.
    pub fn analyze(&self, records: &RecordSet) -> Result<Analysis> {
        self.run(records, DatasetSummary::from_records(records))
    }

    pub fn compare(&self, baseline: &Analysis, candidate: &Analysis) -> Result<Comparison> {
        self.comparison.compare(baseline, candidate)
    }

    /// Analyze both tables and compare the results.
    pub fn compare_tables(&self, baseline: &RawTable, candidate: &RawTable) -> Result<Comparison> {
        let baseline = self.analyze_table(baseline)?;
        let candidate = self.analyze_table(candidate)?;
        self.compare(&baseline, &candidate)
    }

    fn run(&self, records: &RecordSet, dataset: DatasetSummary) -> Result<Analysis> {
        let metrics = self.metrics.calculate(records)?;
        let trends = TrendAnalyzer::new(self.config.trend.clone()).analyze(records);
        let anomalies = self.anomalies.detect(records);
        let insights = self.insights.synthesize(&metrics, &trends, &anomalies);
        let status = self.insights.assess(&metrics);

        info!(
            "Analyzed {} requests: p95 {:.2}ms, error rate {:.2}%, {} anomalies, status {}",
            metrics.errors.total_requests,
            metrics.response_time.p95,
            metrics.errors.error_rate,
            anomalies.anomaly_count,
            status.overall
        );

        Ok(Analysis {
            dataset,
            metrics,
            trends,
            anomalies,
            insights,
            status,
        })
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::build(AnalysisConfig::default())
    }
}
