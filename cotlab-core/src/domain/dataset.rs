//! Raw and typed tabular data.
//!
//! A [`RawTable`] is what a source adapter hands back: ordered column names
//! and rows of untyped cells. A [`Dataset`] is the columnar form every
//! downstream consumer reads: a polars frame whose columns are typed once as
//! `Float64` or `String`.

use polars::prelude::{
    Column, DataFrame, DataType, NamedFrom, PlSmallStr, PolarsError, PolarsResult, Series,
};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Write;
use thiserror::Error;

/// One untyped cell from a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Missing,
    Text(String),
    /// A value the provider already delivered as a number (JSON payloads).
    Number(f64),
}

impl RawValue {
    /// Missing, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Missing => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Missing => None,
            RawValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            RawValue::Number(n) => Some(Cow::Owned(format_number(*n))),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// Ordered column names plus rows of raw cells, one row per
/// (market, report date) observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

/// Borrowed view of one row of a [`RawTable`].
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    columns: &'a [String],
    values: &'a [RawValue],
}

impl<'a> RawRecord<'a> {
    pub fn get(&self, column: &str) -> Option<&'a RawValue> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a RawValue)> + 'a {
        let (columns, values) = (self.columns, self.values);
        columns.iter().map(String::as_str).zip(values.iter())
    }
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with `Missing` and truncating long ones
    /// so every row matches the header width.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        row.resize(self.columns.len(), RawValue::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(|values| RawRecord {
            columns: &self.columns,
            values,
        })
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &RawValue> {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn rename_column(&mut self, index: usize, to: &str) {
        self.columns[index] = to.to_string();
    }

    /// Apply `f` to every cell of one column in place.
    pub fn map_column(&mut self, index: usize, mut f: impl FnMut(&RawValue) -> RawValue) {
        for row in &mut self.rows {
            row[index] = f(&row[index]);
        }
    }

    /// Append a new column. `values` shorter than the table are padded with
    /// `Missing`.
    pub fn push_column(&mut self, name: &str, values: impl IntoIterator<Item = RawValue>) {
        self.columns.push(name.to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or(RawValue::Missing));
        }
    }
}

/// A `Float64` column.
pub fn numeric_column(name: impl Into<PlSmallStr>, values: Vec<Option<f64>>) -> Series {
    Series::new(name.into(), values)
}

/// A `String` column.
pub fn text_column<S: Into<String>>(
    name: impl Into<PlSmallStr>,
    values: Vec<Option<S>>,
) -> Series {
    let values: Vec<Option<String>> = values.into_iter().map(|v| v.map(Into::into)).collect();
    Series::new(name.into(), values)
}

/// Cells of a column rendered as text; numbers use [`format_number`].
pub fn text_values(series: &Series) -> Vec<Option<String>> {
    if let Ok(ca) = series.f64() {
        return ca.into_iter().map(|v| v.map(format_number)).collect();
    }
    if let Ok(ca) = series.str() {
        return ca.into_iter().map(|v| v.map(str::to_string)).collect();
    }
    let Ok(cast) = series.cast(&DataType::String) else {
        return vec![None; series.len()];
    };
    let values = match cast.str() {
        Ok(ca) => ca.into_iter().map(|v| v.map(str::to_string)).collect(),
        Err(_) => vec![None; series.len()],
    };
    values
}

/// Values of a `Float64` column, or `None` for a text column.
pub fn float_values(series: &Series) -> Option<Vec<Option<f64>>> {
    series.f64().ok().map(|ca| ca.into_iter().collect())
}

/// Per-row presence: `false` for missing cells and blank text.
pub fn present_cells(series: &Series) -> Vec<bool> {
    match series.str() {
        Ok(ca) => ca
            .into_iter()
            .map(|v| v.is_some_and(|s| !s.trim().is_empty()))
            .collect(),
        Err(_) => {
            let mask = series.is_not_null();
            mask.into_iter().map(|v| v.unwrap_or(false)).collect()
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset: {0}")]
    Frame(#[from] PolarsError),
}

/// An ordered table of equal-length columns backed by a polars
/// [`DataFrame`]. Every column is either `Float64` or `String`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    frame: DataFrame,
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.frame.schema() == other.frame.schema() && self.frame.equals_missing(&other.frame)
    }
}

impl Dataset {
    /// Build a dataset from columns, rejecting ragged or duplicate columns.
    ///
    /// Integer and `Float32` columns are widened to `Float64`; any other
    /// dtype is rendered as `String`.
    pub fn new(columns: Vec<Series>) -> Result<Self, DatasetError> {
        let columns = columns
            .into_iter()
            .map(|s| supported(s).map(Column::from))
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    /// Frame whose columns are already `Float64` or `String`.
    pub(crate) fn from_frame(frame: DataFrame) -> Self {
        debug_assert!(frame
            .dtypes()
            .iter()
            .all(|d| matches!(d, DataType::Float64 | DataType::String)));
        Self { frame }
    }

    /// Type raw cells column by column.
    ///
    /// A column is numeric here only when every present cell already arrived
    /// as a number; anything else is kept as text for the normalizer.
    /// Duplicate header names get a `.1`, `.2`, ... suffix.
    pub fn from_raw(table: &RawTable) -> Result<Self, DatasetError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut columns = Vec::with_capacity(table.columns().len());

        for (index, name) in table.columns().iter().enumerate() {
            let name = unique_name(name, &seen);
            seen.insert(name.clone());

            let cells: Vec<&RawValue> = table.column_values(index).collect();
            let all_numbers = cells.iter().any(|v| matches!(v, RawValue::Number(_)))
                && cells
                    .iter()
                    .all(|v| matches!(v, RawValue::Number(_) | RawValue::Missing));

            let series = if all_numbers {
                numeric_column(
                    name.as_str(),
                    cells
                        .iter()
                        .map(|v| match v {
                            RawValue::Number(n) => Some(*n),
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                text_column(
                    name.as_str(),
                    cells
                        .iter()
                        .map(|v| v.as_text().map(Cow::into_owned))
                        .collect(),
                )
            };
            columns.push(series);
        }

        Self::new(columns)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn columns(&self) -> impl Iterator<Item = &Series> {
        self.frame
            .get_columns()
            .iter()
            .map(Column::as_materialized_series)
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.frame
            .column(name)
            .ok()
            .map(Column::as_materialized_series)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.schema().contains(name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.column(name)
            .is_some_and(|s| s.dtype() == &DataType::Float64)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(PlSmallStr::as_str)
    }

    /// One cell rendered as text.
    pub fn cell_text(&self, column: &str, row: usize) -> Option<String> {
        self.column(column)
            .and_then(|s| text_values(s).into_iter().nth(row))
            .flatten()
    }

    /// Write the dataset as CSV with a header row. Missing cells are empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let columns: Vec<Vec<Option<String>>> = self.columns().map(text_values).collect();
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.column_names())?;
        for row in 0..self.row_count() {
            wtr.write_record(
                columns
                    .iter()
                    .map(|c| c[row].as_deref().unwrap_or_default()),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn supported(series: Series) -> PolarsResult<Series> {
    let dtype = series.dtype().clone();
    match dtype {
        DataType::Float64 | DataType::String => Ok(series),
        DataType::Float32
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt32
        | DataType::UInt64 => series.cast(&DataType::Float64),
        _ => series.cast(&DataType::String),
    }
}

fn unique_name(name: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Render a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
