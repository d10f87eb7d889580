//! Payload parsers: CSV text and JSON record arrays into [`RawTable`]s.

use super::provider::DataError;
use crate::domain::{RawTable, RawValue};
use std::collections::HashSet;

/// Parse a CSV document with a header row.
///
/// Cells are trimmed and empty cells become [`RawValue::Missing`]. Rows with
/// a different field count than the header are malformed.
pub fn parse_csv(body: &[u8], origin: &str) -> Result<RawTable, DataError> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(DataError::EmptyPayload(origin.to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DataError::malformed(origin, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(DataError::malformed(origin, "missing header row"));
    }

    let mut table = RawTable::new(headers);
    for record in rdr.records() {
        let record = record.map_err(|e| DataError::malformed(origin, e))?;
        table.push_row(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        RawValue::Missing
                    } else {
                        RawValue::Text(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    if table.is_empty() {
        return Err(DataError::EmptyTable(origin.to_string()));
    }
    tracing::debug!(origin, rows = table.len(), columns = table.columns().len(), "parsed csv");
    Ok(table)
}

/// Parse a JSON array of flat objects (the CFTC API's row format).
///
/// Columns are the union of object keys in first-seen order; a key absent
/// from one object is missing in that row.
pub fn parse_json_records(body: &[u8], origin: &str) -> Result<RawTable, DataError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| DataError::malformed(origin, e))?;

    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(obj) => {
            let reason = obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| format!("provider error: {m}"))
                .unwrap_or_else(|| "expected a JSON array of records".to_string());
            return Err(DataError::malformed(origin, reason));
        }
        _ => return Err(DataError::malformed(origin, "expected a JSON array of records")),
    };

    if rows.is_empty() {
        return Err(DataError::EmptyPayload(origin.to_string()));
    }

    let mut objects = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        match row {
            serde_json::Value::Object(obj) => objects.push(obj),
            other => {
                return Err(DataError::malformed(
                    origin,
                    format!("record {i} is not an object: {other}"),
                ))
            }
        }
    }

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for obj in &objects {
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns.clone());
    for obj in &objects {
        table.push_row(
            columns
                .iter()
                .map(|c| obj.get(c).map_or(RawValue::Missing, json_cell))
                .collect(),
        );
    }

    if table.columns().is_empty() {
        return Err(DataError::EmptyTable(origin.to_string()));
    }
    tracing::debug!(origin, rows = table.len(), columns = table.columns().len(), "parsed json");
    Ok(table)
}

fn json_cell(value: &serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Null => RawValue::Missing,
        serde_json::Value::String(s) if s.is_empty() => RawValue::Missing,
        serde_json::Value::String(s) => RawValue::Text(s.clone()),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map_or_else(|| RawValue::Text(n.to_string()), RawValue::Number),
        serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}
