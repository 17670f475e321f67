//! Record normalization
//!
//! Turns an uploaded table with arbitrary column naming into a canonical
//! [`RecordSet`]. Columns are resolved through an enumerated alias table;
//! rows without a usable response time or timestamp are dropped and
//! counted, up to a configured ratio. A row whose status is not a number
//! (JMeter's "Non HTTP response code: ...") is a failed request and is
//! kept.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use perfinsight_common::{
    CellValue, InsightError, NormalizerConfig, Observation, RawTable, RecordSet, Result,
    DEFAULT_STATUS_CODE,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Canonical fields an input column can be resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    ResponseTime,
    StatusCode,
    Timestamp,
    Endpoint,
    TestName,
    UserId,
    ErrorFlag,
    SuccessFlag,
}

impl CanonicalField {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::ResponseTime => "response_time",
            CanonicalField::StatusCode => "status_code",
            CanonicalField::Timestamp => "timestamp",
            CanonicalField::Endpoint => "endpoint",
            CanonicalField::TestName => "test_name",
            CanonicalField::UserId => "user_id",
            CanonicalField::ErrorFlag => "error",
            CanonicalField::SuccessFlag => "success",
        }
    }
}

/// Accepted column names per canonical field, in priority order. Names are
/// compared after [`normalize_column_name`].
pub const COLUMN_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::ResponseTime,
        &[
            "response_time",
            "responsetime",
            "response_time_ms",
            "duration_ms",
            "duration",
            // JMeter exports both; `Latency` is time to first byte only.
            "elapsed",
            "elapsed_ms",
            "latency",
            "latency_ms",
            "average",
        ],
    ),
    (
        CanonicalField::StatusCode,
        &[
            "status_code",
            "statuscode",
            "status",
            "http_status",
            "response_code",
            "responsecode",
            "code",
        ],
    ),
    (
        CanonicalField::Timestamp,
        &["timestamp", "time", "date", "datetime", "ts", "start_time", "time_stamp"],
    ),
    (CanonicalField::Endpoint, &["endpoint", "url", "path", "request", "label", "uri"]),
    (CanonicalField::TestName, &["test_name", "testname", "test", "scenario"]),
    (CanonicalField::UserId, &["user_id", "userid", "user", "thread_name", "threadname"]),
    (CanonicalField::ErrorFlag, &["error", "is_error", "failed", "failure"]),
    (CanonicalField::SuccessFlag, &["success", "succeeded", "ok"]),
];

/// Lowercase, trim and fold separators so "Response Time", "response-time"
/// and "response_time" compare equal.
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '.' || ch == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('_');
        }
        pending_separator = false;
        out.extend(ch.to_lowercase());
    }
    out
}

/// Why a row was dropped during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    MissingResponseTime,
    InvalidResponseTime,
    InvalidTimestamp,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::MissingResponseTime => "missing_response_time",
            DropReason::InvalidResponseTime => "invalid_response_time",
            DropReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// Problem with a row that was kept anyway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowIssue {
    /// Status cell present but not a number; the row counts as failed
    InvalidStatusCode,
}

impl RowIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            RowIssue::InvalidStatusCode => "invalid_status_code",
        }
    }
}

/// Status recorded for a request whose status cell could not be read
pub const UNKNOWN_STATUS_CODE: u16 = 0;

/// Description of the dataset behind a record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub drop_reasons: BTreeMap<String, usize>,
    /// Kept rows that needed a fallback, by issue
    #[serde(default)]
    pub row_issues: BTreeMap<String, usize>,
    /// Parsed rows excluded by a record filter
    #[serde(default)]
    pub filtered_rows: usize,
    /// Canonical field name -> source column name
    pub resolved_columns: BTreeMap<String, String>,
    pub synthetic_timestamps: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: f64,
    pub unique_endpoints: usize,
}

impl DatasetSummary {
    /// Summary for a record set that did not come through the normalizer.
    pub fn from_records(records: &RecordSet) -> Self {
        Self::build(records, records.len(), BTreeMap::new(), BTreeMap::new(), BTreeMap::new())
    }

    fn build(
        records: &RecordSet,
        total_rows: usize,
        drop_reasons: BTreeMap<String, usize>,
        row_issues: BTreeMap<String, usize>,
        resolved_columns: BTreeMap<String, String>,
    ) -> Self {
        let (start, end) = records.time_range();
        let unique_endpoints = records
            .iter()
            .filter_map(|o| o.endpoint.as_deref())
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_rows,
            dropped_rows: total_rows - records.len(),
            drop_reasons,
            row_issues,
            filtered_rows: 0,
            resolved_columns,
            synthetic_timestamps: records.synthetic_timestamps(),
            start,
            end,
            duration_seconds: (end - start).num_milliseconds() as f64 / 1000.0,
            unique_endpoints,
        }
    }
}

/// Successful normalization: the records plus how they were obtained
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: RecordSet,
    pub summary: DatasetSummary,
}

/// Resolved source columns for one table
struct ColumnMap<'a> {
    response_time: &'a [CellValue],
    status_code: Option<&'a [CellValue]>,
    timestamp: Option<&'a [CellValue]>,
    endpoint: Option<&'a [CellValue]>,
    test_name: Option<&'a [CellValue]>,
    user_id: Option<&'a [CellValue]>,
    error_flag: Option<(&'a [CellValue], bool)>,
}

/// Converts uploaded tables into record sets
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    config: NormalizerConfig,
}

impl RecordNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a table into a record set.
    pub fn normalize(&self, table: &RawTable) -> Result<Normalized> {
        let total_rows = table.row_count();
        if total_rows == 0 {
            return Err(InsightError::EmptyDataset("the input table has no rows".to_string()));
        }

        let resolved = resolve_columns(table);
        let column = |field: CanonicalField| -> Option<&[CellValue]> {
            resolved.get(&field).and_then(|name| table.column(name))
        };

        let response_time = column(CanonicalField::ResponseTime).ok_or_else(|| {
            InsightError::Schema(format!(
                "no response time column found among [{}]",
                table.column_names().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let error_flag = column(CanonicalField::ErrorFlag)
            .map(|cells| (cells, false))
            .or_else(|| column(CanonicalField::SuccessFlag).map(|cells| (cells, true)));

        let columns = ColumnMap {
            response_time,
            status_code: column(CanonicalField::StatusCode),
            timestamp: column(CanonicalField::Timestamp),
            endpoint: column(CanonicalField::Endpoint),
            test_name: column(CanonicalField::TestName),
            user_id: column(CanonicalField::UserId),
            error_flag,
        };

        let mut resolved_columns = BTreeMap::new();
        for (field, name) in &resolved {
            debug!("Resolved column '{}' as {}", name, field.as_str());
            resolved_columns.insert(field.as_str().to_string(), name.clone());
        }

        let synthetic_timestamps = columns.timestamp.is_none();
        let mut observations = Vec::with_capacity(total_rows);
        let mut drop_counts: BTreeMap<DropReason, usize> = BTreeMap::new();
        let mut issue_counts: BTreeMap<RowIssue, usize> = BTreeMap::new();

        for row in 0..total_rows {
            match self.parse_row(&columns, row) {
                Ok((observation, issue)) => {
                    if let Some(issue) = issue {
                        *issue_counts.entry(issue).or_insert(0) += 1;
                    }
                    observations.push(observation);
                }
                Err(reason) => *drop_counts.entry(reason).or_insert(0) += 1,
            }
        }

        if !issue_counts.is_empty() {
            warn!("Kept rows with unreadable fields as failed requests ({:?})", issue_counts);
        }

        let dropped_rows = total_rows - observations.len();
        if dropped_rows > 0 {
            warn!(
                "Dropped {} of {} rows during normalization ({:?})",
                dropped_rows, total_rows, drop_counts
            );
        }

        let drop_ratio = dropped_rows as f64 / total_rows as f64;
        if drop_ratio > self.config.max_drop_ratio {
            return Err(InsightError::DataQuality {
                dropped: dropped_rows,
                total: total_rows,
                max_drop_ratio: self.config.max_drop_ratio,
            });
        }

        let records = if synthetic_timestamps {
            RecordSet::with_synthetic_timestamps(observations)
        } else {
            RecordSet::new(observations)
        }
        .map_err(|_| InsightError::EmptyDataset(format!("none of the {} rows could be parsed", total_rows)))?;

        let drop_reasons = drop_counts
            .into_iter()
            .map(|(reason, count)| (reason.as_str().to_string(), count))
            .collect();
        let row_issues = issue_counts
            .into_iter()
            .map(|(issue, count)| (issue.as_str().to_string(), count))
            .collect();
        let summary = DatasetSummary::build(&records, total_rows, drop_reasons, row_issues, resolved_columns);

        debug!(
            "Normalized {} observations (synthetic timestamps: {})",
            records.len(),
            synthetic_timestamps
        );

        Ok(Normalized { records, summary })
    }

    fn parse_row(
        &self,
        columns: &ColumnMap<'_>,
        row: usize,
    ) -> std::result::Result<(Observation, Option<RowIssue>), DropReason> {
        let rt_cell = &columns.response_time[row];
        if rt_cell.is_null() {
            return Err(DropReason::MissingResponseTime);
        }
        let response_time = rt_cell
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or(DropReason::InvalidResponseTime)?;

        let (status_code, issue) = match columns.status_code {
            Some(cells) => match parse_status_code(&cells[row]) {
                Some(code) => (code, None),
                None => (UNKNOWN_STATUS_CODE, Some(RowIssue::InvalidStatusCode)),
            },
            None => (DEFAULT_STATUS_CODE, None),
        };

        let timestamp = match columns.timestamp {
            Some(cells) => parse_timestamp(&cells[row]).ok_or(DropReason::InvalidTimestamp)?,
            None => self.synthetic_timestamp(row).ok_or(DropReason::InvalidTimestamp)?,
        };

        let flagged = match columns.error_flag {
            Some((cells, inverted)) => match parse_flag(&cells[row]) {
                Some(flag) => flag != inverted,
                None => false,
            },
            None => false,
        };
        let is_error = flagged || issue.is_some();

        let observation = Observation {
            timestamp,
            response_time,
            status_code,
            is_error,
            endpoint: columns.endpoint.and_then(|cells| cells[row].as_text()),
            test_name: columns.test_name.and_then(|cells| cells[row].as_text()),
            user_id: columns.user_id.and_then(|cells| cells[row].as_text()),
        };
        Ok((observation, issue))
    }

    fn synthetic_timestamp(&self, row: usize) -> Option<DateTime<Utc>> {
        let offset_ms = (row as i64).checked_mul(self.config.synthetic_interval_ms as i64)?;
        self.config
            .synthetic_start
            .checked_add_signed(TimeDelta::try_milliseconds(offset_ms)?)
    }
}

/// Map each canonical field to the first matching source column.
fn resolve_columns(table: &RawTable) -> HashMap<CanonicalField, String> {
    let mut by_normalized: HashMap<String, &str> = HashMap::new();
    for name in table.column_names() {
        by_normalized.entry(normalize_column_name(name)).or_insert(name);
    }

    let mut resolved = HashMap::new();
    for (field, aliases) in COLUMN_ALIASES {
        if let Some(source) = aliases.iter().find_map(|alias| by_normalized.get(*alias)) {
            resolved.insert(*field, source.to_string());
        }
    }
    resolved
}

fn parse_status_code(cell: &CellValue) -> Option<u16> {
    if cell.is_null() {
        return Some(DEFAULT_STATUS_CODE);
    }
    let value = match cell {
        CellValue::Bool(_) => return None,
        other => other.as_f64()?,
    };
    if value.fract() != 0.0 || !(0.0..=999.0).contains(&value) {
        return None;
    }
    Some(value as u16)
}

fn parse_flag(cell: &CellValue) -> Option<bool> {
    match cell {
        CellValue::Null => None,
        CellValue::Bool(b) => Some(*b),
        CellValue::Int(i) => Some(*i != 0),
        CellValue::Float(f) => Some(*f != 0.0),
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
    }
}

/// Epoch values at or above this magnitude are read as milliseconds.
const EPOCH_MILLIS_CUTOFF: f64 = 1e11;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Tolerant timestamp parsing. Naive date-times are taken as UTC.
pub fn parse_timestamp(cell: &CellValue) -> Option<DateTime<Utc>> {
    match cell {
        CellValue::Null | CellValue::Bool(_) => None,
        CellValue::Int(i) => from_epoch(*i as f64),
        CellValue::Float(f) => from_epoch(*f),
        CellValue::Text(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            if let Ok(number) = text.parse::<f64>() {
                return from_epoch(number);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.with_timezone(&Utc));
            }
            for format in NAIVE_FORMATS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
    }
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    if value.abs() >= EPOCH_MILLIS_CUTOFF {
        DateTime::from_timestamp_millis(value.round() as i64)
    } else {
        let secs = value.floor();
        let nanos = ((value - secs) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn cells<T: Into<CellValue> + Clone>(values: &[T]) -> Vec<CellValue> {
        values.iter().cloned().map(Into::into).collect()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Response Time"), "response_time");
        assert_eq!(normalize_column_name("  response-time "), "response_time");
        assert_eq!(normalize_column_name("ResponseTime"), "responsetime");
        assert_eq!(normalize_column_name("HTTP  Status"), "http_status");
        assert_eq!(normalize_column_name("timeStamp"), "timestamp");
    }

    #[test]
    fn test_aliases_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for (_, aliases) in COLUMN_ALIASES {
            for alias in *aliases {
                assert!(seen.insert(*alias), "alias '{}' listed twice", alias);
                assert_eq!(normalize_column_name(alias), *alias);
            }
        }
    }

    #[test]
    fn test_resolves_tolerant_aliases() {
        let table = RawTable::new()
            .with_column("Duration MS", cells(&[120.0, 80.0]))
            .unwrap()
            .with_column("HTTP Status", cells(&[200_i64, 503]))
            .unwrap()
            .with_column("Date", cells(&["2024-03-01 10:00:00", "2024-03-01 10:00:05"]))
            .unwrap()
            .with_column("URL", cells(&["/login", "/search"]))
            .unwrap();

        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        let records = normalized.records.observations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status_code, 503);
        assert_eq!(records[0].endpoint.as_deref(), Some("/login"));
        assert_eq!(records[1].timestamp.second(), 5);
        assert_eq!(
            normalized.summary.resolved_columns.get("response_time").map(String::as_str),
            Some("Duration MS")
        );
        assert!(!normalized.summary.synthetic_timestamps);
        assert_eq!(normalized.summary.unique_endpoints, 2);
        assert_eq!(normalized.summary.duration_seconds, 5.0);
    }

    #[test]
    fn test_missing_response_time_is_schema_error() {
        let table = RawTable::new()
            .with_column("status", cells(&[200_i64]))
            .unwrap();
        let err = RecordNormalizer::default().normalize(&table).unwrap_err();
        assert!(matches!(err, InsightError::Schema(_)));
    }

    #[test]
    fn test_empty_table_is_empty_dataset() {
        let err = RecordNormalizer::default().normalize(&RawTable::new()).unwrap_err();
        assert!(matches!(err, InsightError::EmptyDataset(_)));

        let headers_only = RawTable::new().with_column("latency", Vec::new()).unwrap();
        let err = RecordNormalizer::default().normalize(&headers_only).unwrap_err();
        assert!(matches!(err, InsightError::EmptyDataset(_)));
    }

    #[test]
    fn test_synthetic_timestamps_are_evenly_spaced() {
        let table = RawTable::new()
            .with_column("latency", cells(&[1.0, 2.0, 3.0]))
            .unwrap();
        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        let records = normalized.records.observations();

        assert!(normalized.records.synthetic_timestamps());
        assert_eq!(records[0].timestamp, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!((records[2].timestamp - records[1].timestamp).num_milliseconds(), 1000);
        assert!(records.iter().all(|o| o.status_code == 200));
    }

    #[test]
    fn test_bad_rows_dropped_within_ratio() {
        let table = RawTable::new()
            .with_column(
                "response_time",
                vec![
                    CellValue::Float(10.0),
                    CellValue::Text("n/a".to_string()),
                    CellValue::Float(30.0),
                    CellValue::Float(-5.0),
                    CellValue::Float(50.0),
                ],
            )
            .unwrap();

        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        assert_eq!(normalized.records.len(), 3);
        assert_eq!(normalized.summary.dropped_rows, 2);
        assert_eq!(normalized.summary.drop_reasons.get("invalid_response_time"), Some(&2));
        assert_eq!(normalized.records.response_times(), vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn test_too_many_bad_rows_is_data_quality_error() {
        let table = RawTable::new()
            .with_column("latency", cells(&[1.0, 2.0, 3.0]))
            .unwrap()
            .with_column("timestamp", cells(&["garbage", "2024-01-01", "not a date"]))
            .unwrap();

        let err = RecordNormalizer::default().normalize(&table).unwrap_err();
        match err {
            InsightError::DataQuality { dropped, total, .. } => {
                assert_eq!(dropped, 2);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_rows_dropped_with_full_tolerance_is_empty_dataset() {
        let config = NormalizerConfig {
            max_drop_ratio: 1.0,
            ..Default::default()
        };
        let table = RawTable::new()
            .with_column("latency", vec![CellValue::Null, CellValue::Text("x".into())])
            .unwrap();
        let err = RecordNormalizer::new(config).normalize(&table).unwrap_err();
        assert!(matches!(err, InsightError::EmptyDataset(_)));
    }

    #[test]
    fn test_non_numeric_status_is_kept_as_failure() {
        let table = RawTable::new()
            .with_column("elapsed", cells(&[100.0, 100.0, 100.0, 100.0]))
            .unwrap()
            .with_column(
                "responseCode",
                vec![
                    CellValue::Int(200),
                    CellValue::Text("Non HTTP response code: java.net.SocketTimeoutException".into()),
                    CellValue::Int(200),
                    CellValue::Int(200),
                ],
            )
            .unwrap()
            .with_column("success", cells(&[true, false, true, true]))
            .unwrap();

        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        let records = normalized.records.observations();
        assert_eq!(records.len(), 4);
        assert_eq!(normalized.summary.dropped_rows, 0);
        assert!(normalized.summary.drop_reasons.is_empty());
        assert_eq!(normalized.summary.row_issues.get("invalid_status_code"), Some(&1));
        assert!(records[1].failed());
        assert_eq!(records[1].status_code, UNKNOWN_STATUS_CODE);
        assert!(!records[0].failed());
    }

    #[test]
    fn test_unreadable_status_fails_without_error_column() {
        let table = RawTable::new()
            .with_column("elapsed", cells(&[100.0, 100.0, 100.0]))
            .unwrap()
            .with_column("status", cells(&["Non HTTP response code: x", "timeout", "200"]))
            .unwrap();

        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        let failed = normalized.records.iter().filter(|o| o.failed()).count();
        assert_eq!(normalized.records.len(), 3);
        assert_eq!(failed, 2);
        assert_eq!(normalized.summary.row_issues.get("invalid_status_code"), Some(&2));
    }

    #[test]
    fn test_elapsed_outranks_latency() {
        let table = RawTable::new()
            .with_column("Latency", cells(&[20.0, 30.0]))
            .unwrap()
            .with_column("elapsed", cells(&[120.0, 130.0]))
            .unwrap();

        let normalized = RecordNormalizer::default().normalize(&table).unwrap();
        assert_eq!(normalized.records.response_times(), vec![120.0, 130.0]);
        assert_eq!(
            normalized.summary.resolved_columns.get("response_time").map(String::as_str),
            Some("elapsed")
        );
    }

    #[test]
    fn test_error_and_success_flags() {
        let table = RawTable::new()
            .with_column("elapsed", cells(&[5.0, 6.0, 7.0]))
            .unwrap()
            .with_column("success", cells(&["true", "false", "maybe"]))
            .unwrap();
        let records = RecordNormalizer::default().normalize(&table).unwrap().records;
        let flags: Vec<bool> = records.iter().map(|o| o.is_error).collect();
        assert_eq!(flags, vec![false, true, false]);

        let table = RawTable::new()
            .with_column("elapsed", cells(&[5.0, 6.0]))
            .unwrap()
            .with_column("is_error", cells(&[1_i64, 0]))
            .unwrap();
        let records = RecordNormalizer::default().normalize(&table).unwrap().records;
        assert!(records.observations()[0].is_error);
        assert!(!records.observations()[1].is_error);
    }

    #[test]
    fn test_status_code_parsing() {
        assert_eq!(parse_status_code(&CellValue::Null), Some(200));
        assert_eq!(parse_status_code(&CellValue::Text("404".into())), Some(404));
        assert_eq!(parse_status_code(&CellValue::Float(500.0)), Some(500));
        assert_eq!(parse_status_code(&CellValue::Float(200.5)), None);
        assert_eq!(parse_status_code(&CellValue::Text("OK".into())), None);
        assert_eq!(parse_status_code(&CellValue::Int(1200)), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let rfc = parse_timestamp(&CellValue::Text("2024-05-06T07:08:09+02:00".into())).unwrap();
        assert_eq!(rfc.hour(), 5);

        let millis = parse_timestamp(&CellValue::Int(1_700_000_000_000)).unwrap();
        let secs = parse_timestamp(&CellValue::Int(1_700_000_000)).unwrap();
        assert_eq!(millis, secs);

        let slashed = parse_timestamp(&CellValue::Text("2024/01/02 03:04:05".into())).unwrap();
        assert_eq!((slashed.month(), slashed.day(), slashed.minute()), (1, 2, 4));

        let date_only = parse_timestamp(&CellValue::Text("2024-02-29".into())).unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp(&CellValue::Text("yesterday".into())).is_none());
        assert!(parse_timestamp(&CellValue::Bool(true)).is_none());
    }
}
