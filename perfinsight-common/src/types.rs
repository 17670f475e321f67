use crate::error::{InsightError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status codes at or above this value count as failed requests.
pub const HTTP_ERROR_THRESHOLD: u16 = 400;

/// Status code assumed when the source table carries none.
pub const DEFAULT_STATUS_CODE: u16 = 200;

/// A single cell of an uploaded table, before any interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Infer a typed cell from raw text, as read from a delimited file.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Column-oriented table as handed over by a file decoder.
///
/// Column order is the order of insertion. Every column holds exactly
/// `row_count()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: IndexMap<String, Vec<CellValue>>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. Fails when its length disagrees with existing columns
    /// or a column of the same name already exists.
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<CellValue>) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.columns.values().next() {
            if existing.len() != cells.len() {
                return Err(InsightError::Schema(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    cells.len(),
                    existing.len()
                )));
            }
        }
        if self.columns.contains_key(&name) {
            return Err(InsightError::Schema(format!("duplicate column '{}'", name)));
        }
        self.columns.insert(name, cells);
        Ok(())
    }

    /// Builder-style variant of [`RawTable::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, cells: Vec<CellValue>) -> Result<Self> {
        self.push_column(name, cells)?;
        Ok(self)
    }

    /// Build a table from row records. Columns are created in first-seen
    /// order; a row lacking a column gets `Null` there.
    pub fn from_rows(rows: Vec<IndexMap<String, CellValue>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let cells = rows
                .iter()
                .map(|row| row.get(&name).cloned().unwrap_or(CellValue::Null))
                .collect();
            columns.insert(name, cells);
        }

        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// One normalized request record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    /// Milliseconds, finite and non-negative.
    pub response_time: f64,
    pub status_code: u16,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, response_time: f64, status_code: u16) -> Self {
        Self {
            timestamp,
            response_time,
            status_code,
            is_error: false,
            endpoint: None,
            test_name: None,
            user_id: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_error_flag(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    /// A request failed when its status is an HTTP error or it was
    /// explicitly flagged as an error.
    pub fn failed(&self) -> bool {
        self.status_code >= HTTP_ERROR_THRESHOLD || self.is_error
    }
}

/// Ordered, non-empty sequence of observations from one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSet {
    observations: Vec<Observation>,
    synthetic_timestamps: bool,
}

impl RecordSet {
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        Self::build(observations, false)
    }

    /// Same as [`RecordSet::new`] for observations whose timestamps were
    /// generated from row positions rather than read from the source.
    pub fn with_synthetic_timestamps(observations: Vec<Observation>) -> Result<Self> {
        Self::build(observations, true)
    }

    fn build(observations: Vec<Observation>, synthetic_timestamps: bool) -> Result<Self> {
        if observations.is_empty() {
            return Err(InsightError::EmptyDataset(
                "a record set needs at least one observation".to_string(),
            ));
        }
        Ok(Self {
            observations,
            synthetic_timestamps,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false for a constructed record set.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn synthetic_timestamps(&self) -> bool {
        self.synthetic_timestamps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn response_times(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.response_time).collect()
    }

    /// Earliest and latest timestamp.
    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let first = self.observations[0].timestamp;
        self.observations
            .iter()
            .fold((first, first), |(lo, hi), o| (lo.min(o.timestamp), hi.max(o.timestamp)))
    }

    /// Subset matching every criterion of `filter`, in original order.
    pub fn filter(&self, filter: &RecordFilter) -> Result<RecordSet> {
        let kept: Vec<Observation> = self
            .observations
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();

        if kept.is_empty() {
            return Err(InsightError::EmptyDataset(
                "no observations match the filter".to_string(),
            ));
        }

        Self::build(kept, self.synthetic_timestamps)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Selection criteria over observations. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub endpoints: Option<Vec<String>>,
    pub test_names: Option<Vec<String>>,
    pub status_codes: Option<Vec<u16>>,
    pub min_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        *self == RecordFilter::default()
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        if let Some(endpoints) = &self.endpoints {
            match &observation.endpoint {
                Some(endpoint) if endpoints.iter().any(|e| e == endpoint) => {}
                _ => return false,
            }
        }
        if let Some(names) = &self.test_names {
            match &observation.test_name {
                Some(name) if names.iter().any(|n| n == name) => {}
                _ => return false,
            }
        }
        if let Some(codes) = &self.status_codes {
            if !codes.contains(&observation.status_code) {
                return false;
            }
        }
        if let Some(min) = self.min_response_time {
            if observation.response_time < min {
                return false;
            }
        }
        if let Some(max) = self.max_response_time {
            if observation.response_time > max {
                return false;
            }
        }
        if let Some(from) = self.from {
            if observation.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if observation.timestamp > to {
                return false;
            }
        }
        true
    }
}
