//! Summary statistics for numeric columns.

use crate::domain::Dataset;
use polars::prelude::{ChunkAgg, ChunkQuantile, ChunkVar, Float64Chunked, QuantileMethod};
use serde::Serialize;

/// Describe-style statistics of one numeric column over its defined values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Summaries for every numeric column, in column order.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .columns()
        .filter_map(|column| {
            column
                .f64()
                .ok()
                .map(|values| summarize(column.name(), values))
        })
        .collect()
}

fn summarize(name: &str, values: &Float64Chunked) -> ColumnSummary {
    let count = values.len() - values.null_count();
    let quantile = |q: f64| {
        values
            .quantile(q, QuantileMethod::Linear)
            .ok()
            .flatten()
    };

    ColumnSummary {
        column: name.to_string(),
        count,
        mean: values.mean(),
        std: if count > 1 { values.std(1) } else { None },
        min: values.min(),
        p25: quantile(0.25),
        median: quantile(0.5),
        p75: quantile(0.75),
        max: values.max(),
    }
}
