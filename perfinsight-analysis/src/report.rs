//! Report rendering
//!
//! A [`Report`] wraps an analysis or comparison for presentation. Renderers
//! turn it into bytes in a [`ReportFormat`]. The built-in renderer covers
//! HTML, Markdown and JSON; binary formats are left to external renderers
//! implementing [`ReportRenderer`].

use crate::analysis::Analysis;
use crate::comparison::Comparison;
use crate::insights::InsightSet;
use crate::utils::{format_change, format_millis};
use chrono::{DateTime, Utc};
use perfinsight_common::{InsightError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

const NO_RECOMMENDATIONS: &str = "No specific recommendations at this time.";

/// Anomaly rows listed individually before the list is truncated
const MAX_LISTED_ANOMALIES: usize = 20;

/// Output formats a report can be requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Html,
    Excel,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
            ReportFormat::Excel => "xlsx",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
            ReportFormat::Excel => "excel",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

impl FromStr for ReportFormat {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "html" | "htm" => Ok(ReportFormat::Html),
            "excel" | "xlsx" => Ok(ReportFormat::Excel),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(InsightError::Render(format!("unknown report format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportBody {
    Analysis(Box<Analysis>),
    Comparison(Box<Comparison>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub body: ReportBody,
}

impl Report {
    pub fn analysis(title: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            body: ReportBody::Analysis(Box::new(analysis)),
        }
    }

    pub fn comparison(title: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            body: ReportBody::Comparison(Box::new(comparison)),
        }
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// Renders reports into a byte representation of some format
pub trait ReportRenderer: Send + Sync {
    fn supports(&self, format: ReportFormat) -> bool;

    fn render(&self, report: &Report, format: ReportFormat) -> Result<Vec<u8>>;
}

/// Renderer for the text-based formats
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRenderer;

impl ReportRenderer for BuiltinRenderer {
    fn supports(&self, format: ReportFormat) -> bool {
        matches!(format, ReportFormat::Html | ReportFormat::Markdown | ReportFormat::Json)
    }

    fn render(&self, report: &Report, format: ReportFormat) -> Result<Vec<u8>> {
        let bytes = match format {
            ReportFormat::Json => serde_json::to_vec_pretty(report)?,
            ReportFormat::Html => to_html(&report.title, &build_document(report)).into_bytes(),
            ReportFormat::Markdown => to_markdown(&report.title, &build_document(report)).into_bytes(),
            ReportFormat::Pdf | ReportFormat::Excel => {
                return Err(InsightError::Render(format!(
                    "no renderer registered for {} output",
                    format
                )))
            }
        };

        debug!("Rendered {} report '{}' ({} bytes)", format, report.title, bytes.len());
        Ok(bytes)
    }
}

/// Format-neutral building blocks shared by the HTML and Markdown output
enum Block {
    Heading(String),
    Paragraph(String),
    List(Vec<String>),
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> Block {
    Block::Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

fn list_or(items: &[String], empty: &str) -> Block {
    if items.is_empty() {
        Block::Paragraph(empty.to_string())
    } else {
        Block::List(items.to_vec())
    }
}

fn build_document(report: &Report) -> Vec<Block> {
    let mut blocks = vec![Block::Paragraph(format!(
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ))];

    match &report.body {
        ReportBody::Analysis(analysis) => analysis_blocks(analysis, &mut blocks),
        ReportBody::Comparison(comparison) => comparison_blocks(comparison, &mut blocks),
    }
    blocks
}

fn analysis_blocks(analysis: &Analysis, blocks: &mut Vec<Block>) {
    let metrics = &analysis.metrics;
    let rt = &metrics.response_time;
    let status = &analysis.status;

    let throughput_status = status
        .throughput
        .map(|rating| format!(", throughput: {}", rating))
        .unwrap_or_default();
    blocks.push(Block::Paragraph(format!(
        "Status: {} (response time: {}, error rate: {}{})",
        status.overall.to_string().to_uppercase(),
        status.response_time,
        status.error_rate,
        throughput_status
    )));

    blocks.push(Block::Heading("Key Performance Indicators".to_string()));
    let throughput = metrics
        .throughput
        .requests_per_second
        .map(|rps| format!("{:.2} req/s", rps))
        .unwrap_or_else(|| "n/a".to_string());
    blocks.push(table(
        &["Metric", "Value"],
        vec![
            vec!["Mean response time".to_string(), format_millis(rt.mean)],
            vec!["Median (p50)".to_string(), format_millis(rt.p50)],
            vec!["p90".to_string(), format_millis(rt.p90)],
            vec!["p95".to_string(), format_millis(rt.p95)],
            vec!["p99".to_string(), format_millis(rt.p99)],
            vec!["Min".to_string(), format_millis(rt.min)],
            vec!["Max".to_string(), format_millis(rt.max)],
            vec!["Error rate".to_string(), format!("{:.2}%", metrics.errors.error_rate)],
            vec!["Total requests".to_string(), metrics.errors.total_requests.to_string()],
            vec!["Throughput".to_string(), throughput],
        ],
    ));

    if !metrics.status_codes.is_empty() {
        blocks.push(Block::Heading("Status Codes".to_string()));
        blocks.push(table(
            &["Status", "Requests"],
            metrics
                .status_codes
                .iter()
                .map(|(code, count)| vec![code.to_string(), count.to_string()])
                .collect(),
        ));
    }

    if !metrics.endpoints.is_empty() {
        blocks.push(Block::Heading("Endpoints".to_string()));
        blocks.push(table(
            &["Endpoint", "Requests", "Mean", "p95", "Min", "Max", "Error rate"],
            metrics
                .endpoints
                .iter()
                .map(|(endpoint, stats)| {
                    vec![
                        endpoint.clone(),
                        stats.count.to_string(),
                        format_millis(stats.mean),
                        format_millis(stats.p95),
                        format_millis(stats.min),
                        format_millis(stats.max),
                        format!("{:.2}%", stats.error_rate),
                    ]
                })
                .collect(),
        ));
    }

    blocks.push(Block::Heading("Trends".to_string()));
    let describe = |name: &str, trend: &crate::trend::MetricTrend| {
        let change = trend
            .change_pct
            .map(|pct| format!(" ({})", format_change(pct)))
            .unwrap_or_default();
        format!("{}: {}{} over {} buckets", name, trend.direction, change, trend.bucket_count)
    };
    blocks.push(Block::List(vec![
        describe("Response time", &analysis.trends.response_time),
        describe("Error rate", &analysis.trends.error_rate),
    ]));

    let anomalies = &analysis.anomalies;
    blocks.push(Block::Heading("Anomalies".to_string()));
    let bounds = match (anomalies.lower_bound, anomalies.upper_bound) {
        (Some(lower), Some(upper)) => format!(
            ", outside [{}, {}]",
            format_millis(lower.max(0.0)),
            format_millis(upper)
        ),
        _ => String::new(),
    };
    blocks.push(Block::Paragraph(format!(
        "{} anomalies ({:.2}% of requests) by {} with k = {}{}",
        anomalies.anomaly_count, anomalies.anomaly_percentage, anomalies.method, anomalies.k, bounds
    )));
    if !anomalies.anomalies.is_empty() {
        blocks.push(table(
            &["Row", "Timestamp", "Response time", "z-score"],
            anomalies
                .anomalies
                .iter()
                .take(MAX_LISTED_ANOMALIES)
                .map(|a| {
                    vec![
                        a.index.to_string(),
                        a.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        format_millis(a.response_time),
                        format!("{:.2}", a.z_score),
                    ]
                })
                .collect(),
        ));
        if anomalies.anomalies.len() > MAX_LISTED_ANOMALIES {
            blocks.push(Block::Paragraph(format!(
                "{} more anomalies not listed",
                anomalies.anomalies.len() - MAX_LISTED_ANOMALIES
            )));
        }
    }

    insight_blocks(&analysis.insights, "", blocks);

    let dataset = &analysis.dataset;
    blocks.push(Block::Heading("Dataset".to_string()));
    let mut rows = vec![
        vec!["Rows".to_string(), dataset.total_rows.to_string()],
        vec!["Dropped rows".to_string(), dataset.dropped_rows.to_string()],
    ];
    for (reason, count) in &dataset.drop_reasons {
        rows.push(vec![format!("Dropped: {}", reason), count.to_string()]);
    }
    for (issue, count) in &dataset.row_issues {
        rows.push(vec![format!("Kept as failed: {}", issue), count.to_string()]);
    }
    if dataset.filtered_rows > 0 {
        rows.push(vec!["Filtered out".to_string(), dataset.filtered_rows.to_string()]);
    }
    rows.push(vec![
        "Time range".to_string(),
        if dataset.synthetic_timestamps {
            "n/a (no timestamp column)".to_string()
        } else {
            format!(
                "{} to {} ({:.0}s)",
                dataset.start.format("%Y-%m-%d %H:%M:%S"),
                dataset.end.format("%Y-%m-%d %H:%M:%S"),
                dataset.duration_seconds
            )
        },
    ]);
    rows.push(vec!["Unique endpoints".to_string(), dataset.unique_endpoints.to_string()]);
    for (field, column) in &dataset.resolved_columns {
        rows.push(vec![format!("Column: {}", field), column.clone()]);
    }
    blocks.push(table(&["Property", "Value"], rows));
}

fn insight_blocks(insights: &InsightSet, prefix: &str, blocks: &mut Vec<Block>) {
    blocks.push(Block::Heading(format!("{}Key Findings", prefix)));
    blocks.push(list_or(&insights.key_findings, "No significant findings."));
    blocks.push(Block::Heading(format!("{}Risk Areas", prefix)));
    blocks.push(list_or(&insights.risk_areas, "No risk areas identified."));
    blocks.push(Block::Heading(format!("{}Recommendations", prefix)));
    blocks.push(list_or(&insights.recommendations, NO_RECOMMENDATIONS));
}

fn comparison_blocks(comparison: &Comparison, blocks: &mut Vec<Block>) {
    blocks.push(Block::Paragraph(format!(
        "Verdict: {}",
        comparison.verdict.to_string().to_uppercase()
    )));
    blocks.push(Block::List(comparison.verdict_reasons.clone()));

    blocks.push(Block::Heading("Metric Deltas".to_string()));
    blocks.push(table(
        &["Metric", "Baseline", "Candidate", "Delta", "Change"],
        comparison
            .deltas
            .iter()
            .map(|(key, delta)| {
                vec![
                    key.clone(),
                    format!("{:.2}", delta.baseline),
                    format!("{:.2}", delta.candidate),
                    format!("{:+.2}", delta.delta),
                    delta
                        .percent_change
                        .map(format_change)
                        .unwrap_or_else(|| "n/a".to_string()),
                ]
            })
            .collect(),
    ));

    insight_blocks(&comparison.baseline.insights, "Baseline ", blocks);
    insight_blocks(&comparison.candidate.insights, "Candidate ", blocks);
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn to_html(title: &str, blocks: &[Block]) -> String {
    let title = escape_html(title);
    let mut html = String::new();

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        table {{ border-collapse: collapse; margin: 16px 0; }}
        th, td {{ padding: 6px 12px; text-align: left; border-bottom: 1px solid #ddd; }}
    </style>
</head>
<body>
<h1>{}</h1>
"#,
        title, title
    ));

    for block in blocks {
        match block {
            Block::Heading(text) => html.push_str(&format!("<h2>{}</h2>\n", escape_html(text))),
            Block::Paragraph(text) => html.push_str(&format!("<p>{}</p>\n", escape_html(text))),
            Block::List(items) => {
                html.push_str("<ul>\n");
                for item in items {
                    html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
                }
                html.push_str("</ul>\n");
            }
            Block::Table { headers, rows } => {
                html.push_str("<table>\n<tr>");
                for header in headers {
                    html.push_str(&format!("<th>{}</th>", escape_html(header)));
                }
                html.push_str("</tr>\n");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in row {
                        html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("</table>\n");
            }
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn to_markdown(title: &str, blocks: &[Block]) -> String {
    let mut md = format!("# {}\n\n", title);

    for block in blocks {
        match block {
            Block::Heading(text) => md.push_str(&format!("## {}\n\n", text)),
            Block::Paragraph(text) => md.push_str(&format!("{}\n\n", text)),
            Block::List(items) => {
                for item in items {
                    md.push_str(&format!("- {}\n", item));
                }
                md.push('\n');
            }
            Block::Table { headers, rows } => {
                let cells: Vec<String> = headers.iter().map(|h| escape_markdown_cell(h)).collect();
                md.push_str(&format!("| {} |\n", cells.join(" | ")));
                md.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|c| escape_markdown_cell(c)).collect();
                    md.push_str(&format!("| {} |\n", cells.join(" | ")));
                }
                md.push('\n');
            }
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisEngine;
    use chrono::TimeZone;
    use perfinsight_common::{Observation, RecordSet};

    fn analysis(endpoint: &str) -> Analysis {
        let records = RecordSet::new(
            (0..10)
                .map(|i| {
                    // One request per millisecond keeps throughput above every floor.
                    Observation::new(Utc.timestamp_millis_opt(1_700_000_000_000 + i).unwrap(), 100.0 + i as f64, 200)
                        .with_endpoint(endpoint)
                })
                .collect(),
        )
        .unwrap();
        AnalysisEngine::default().analyze(&records).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("HTML".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert_eq!("Markdown".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("excel".parse::<ReportFormat>().unwrap(), ReportFormat::Excel);
        assert!(matches!("docx".parse::<ReportFormat>(), Err(InsightError::Render(_))));
    }

    #[test]
    fn test_html_escapes_text() {
        let report = Report::analysis("Run <1> & co", analysis("/search?q=<script>"));
        let html = String::from_utf8(BuiltinRenderer.render(&report, ReportFormat::Html).unwrap()).unwrap();

        assert!(html.contains("<title>Run &lt;1&gt; &amp; co</title>"));
        assert!(html.contains("/search?q=&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(NO_RECOMMENDATIONS));
    }

    #[test]
    fn test_markdown_sections() {
        let report = Report::analysis("Nightly", analysis("/home"));
        let md = String::from_utf8(BuiltinRenderer.render(&report, ReportFormat::Markdown).unwrap()).unwrap();

        assert!(md.starts_with("# Nightly\n"));
        assert!(md.contains("## Key Performance Indicators"));
        assert!(md.contains("| /home | 10 |"));
        assert!(md.contains("## Recommendations"));
        assert!(md.contains("Status: OK (response time: ok, error rate: ok, throughput: ok)"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let report = Report::analysis("Json", analysis("/a"));
        let bytes = BuiltinRenderer.render(&report, ReportFormat::Json).unwrap();
        let parsed: Report = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.title, "Json");
        assert!(matches!(parsed.body, ReportBody::Analysis(_)));
    }

    #[test]
    fn test_binary_formats_need_external_renderer() {
        let report = Report::analysis("Pdf", analysis("/a"));
        assert!(!BuiltinRenderer.supports(ReportFormat::Pdf));
        let err = BuiltinRenderer.render(&report, ReportFormat::Pdf).unwrap_err();
        assert!(matches!(err, InsightError::Render(_)));
        assert!(err.to_string().contains("no renderer registered"));
    }

    #[test]
    fn test_comparison_report_lists_deltas() {
        let engine = AnalysisEngine::default();
        let comparison = engine.compare(&analysis("/a"), &analysis("/a")).unwrap();
        let report = Report::comparison("Compare", comparison);
        let md = String::from_utf8(BuiltinRenderer.render(&report, ReportFormat::Markdown).unwrap()).unwrap();

        assert!(md.contains("Verdict: UNCHANGED"));
        assert!(md.contains("| response_time.p95 |"));
        assert!(md.contains("## Candidate Recommendations"));
    }
}
