//! PerfInsight
//!
//! Performance-test result analysis: normalization of uploaded tables,
//! summary metrics, trends, anomalies, rule-based insights, baseline
//! comparison and report rendering.

pub use perfinsight_analysis as analysis;
pub use perfinsight_common as common;

/// Analyze a table with the default configuration.
pub fn analyze(table: &common::RawTable) -> common::Result<analysis::Analysis> {
    analysis::AnalysisEngine::default().analyze_table(table)
}

/// Analyze two tables with the default configuration and compare them.
pub fn compare(baseline: &common::RawTable, candidate: &common::RawTable) -> common::Result<analysis::Comparison> {
    analysis::AnalysisEngine::default().compare_tables(baseline, candidate)
}

pub mod prelude {
    pub use perfinsight_analysis::{
        Analysis, AnalysisEngine, BuiltinRenderer, Comparison, Report, ReportFormat, ReportRenderer, Verdict,
    };
    pub use perfinsight_common::{
        AnalysisConfig, CellValue, InsightError, Profile, RawTable, RecordFilter, Result, ThresholdConfig,
    };
}
