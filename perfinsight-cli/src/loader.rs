//! Decoding of result files into tables
//!
//! CSV files become one column per header. JSON files may hold either an
//! array of row objects or an object mapping column names to arrays.

use crate::UsageError;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use perfinsight_common::{CellValue, RawTable};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub fn load_table(path: &Path) -> Result<RawTable> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" => read_csv(path)?,
        "json" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_json(&content).with_context(|| format!("Failed to decode {}", path.display()))?
        }
        other => {
            return Err(UsageError(format!(
                "unsupported input '{}': expected a .csv or .json file, got extension '{}'",
                path.display(),
                other
            ))
            .into())
        }
    };

    debug!(
        "Loaded {} rows and {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    parse_csv(&mut reader).with_context(|| format!("Failed to decode {}", path.display()))
}

fn parse_csv<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<RawTable> {
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        for (column, raw) in columns.iter_mut().zip(record.iter()) {
            column.push(CellValue::infer(raw));
        }
    }

    let mut table = RawTable::new();
    for (name, cells) in headers.into_iter().zip(columns) {
        table.push_column(name, cells)?;
    }
    Ok(table)
}

fn parse_json(content: &str) -> Result<RawTable> {
    let value: Value = serde_json::from_str(content).context("Invalid JSON")?;

    match value {
        Value::Array(rows) => {
            let mut records = Vec::with_capacity(rows.len());
            for (index, row) in rows.into_iter().enumerate() {
                let Value::Object(fields) = row else {
                    bail!("row {} is not a JSON object", index);
                };
                let record: IndexMap<String, CellValue> =
                    fields.into_iter().map(|(key, value)| (key, to_cell(value))).collect();
                records.push(record);
            }
            Ok(RawTable::from_rows(records))
        }
        Value::Object(columns) => {
            let mut table = RawTable::new();
            for (name, values) in columns {
                let Value::Array(values) = values else {
                    bail!("column '{}' is not a JSON array", name);
                };
                table.push_column(name, values.into_iter().map(to_cell).collect())?;
            }
            Ok(table)
        }
        _ => bail!("expected an array of row objects or an object of column arrays"),
    }
}

fn to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
        },
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}
