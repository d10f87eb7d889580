//! Column classification for exploratory display.

use crate::data::canonicalize::parse_iso_date;
use crate::domain::Dataset;
use chrono::NaiveDate;
use polars::prelude::{DataType, Series};
use serde::Serialize;

/// Disjoint, exhaustive partition of a dataset's column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnPartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub datetime: Vec<String>,
}

impl ColumnPartition {
    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len() + self.datetime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition columns by type.
///
/// Numeric columns are numeric. A text column is datetime when it has at
/// least one value and every present value is an ISO or `MM/DD/YYYY` date.
/// Everything else, including all-missing columns, is categorical.
/// Each group keeps dataset column order.
pub fn classify(dataset: &Dataset) -> ColumnPartition {
    let mut partition = ColumnPartition::default();
    for column in dataset.columns() {
        let group = match column.dtype() {
            DataType::Float64 => &mut partition.numeric,
            DataType::String if is_date_column(column) => &mut partition.datetime,
            _ => &mut partition.categorical,
        };
        group.push(column.name().to_string());
    }
    partition
}

fn is_date_column(column: &Series) -> bool {
    let Ok(values) = column.str() else {
        return false;
    };
    let mut present = values
        .into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .peekable();
    present.peek().is_some() && present.all(|v| looks_like_date(v))
}

fn looks_like_date(value: &str) -> bool {
    parse_iso_date(value).is_some()
        || NaiveDate::parse_from_str(value.trim(), "%m/%d/%Y").is_ok()
}
