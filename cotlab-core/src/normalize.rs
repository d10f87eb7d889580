//! Type normalization: blank-row removal and majority-vote numeric promotion.
//!
//! `normalize` is total. Malformed cells degrade to missing values inside a
//! promoted column, or the whole column stays text.

use crate::domain::{present_cells, Dataset};
use polars::prelude::{BooleanChunked, DataFrame, NamedFrom, NewChunkedArray, PolarsResult, Series};

/// What a normalization pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    /// Rows removed because every field was missing or blank.
    pub dropped_rows: usize,
    /// Text columns promoted to numeric, in column order.
    pub promoted: Vec<String>,
}

/// Parse one cell as a number after stripping `,`, `$` and `%`.
///
/// Returns `None` for blank, unparseable or non-finite values. This is the
/// single cell coercion rule shared by the normalizer and the net position
/// deriver.
pub fn parse_numeric_cell(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Normalize a dataset. See [`normalize_with_summary`].
pub fn normalize(dataset: Dataset) -> Dataset {
    normalize_with_summary(dataset).0
}

/// Drop blank rows and promote mostly-numeric text columns.
///
/// A text column becomes numeric only when strictly more than half of the
/// rows parse with [`parse_numeric_cell`]; unparseable cells in a promoted
/// column become missing. Numeric columns are never touched.
///
/// Promotion can empty a row (every cell unparseable), so blank-row removal
/// and promotion repeat until a pass promotes nothing. At that point no row
/// is blank and no remaining text column clears the threshold, which makes
/// the function idempotent.
pub fn normalize_with_summary(dataset: Dataset) -> (Dataset, NormalizeSummary) {
    let frame = dataset.into_frame();
    match normalize_frame(frame.clone()) {
        Ok((frame, summary)) => (Dataset::from_frame(frame), summary),
        Err(e) => {
            tracing::warn!(error = %e, "normalization failed, keeping dataset as loaded");
            (Dataset::from_frame(frame), NormalizeSummary::default())
        }
    }
}

fn normalize_frame(mut frame: DataFrame) -> PolarsResult<(DataFrame, NormalizeSummary)> {
    let mut summary = NormalizeSummary::default();

    loop {
        let keep = non_blank_rows(&frame);
        let kept = keep.iter().filter(|k| **k).count();
        if kept < frame.height() {
            summary.dropped_rows += frame.height() - kept;
            frame = frame.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
        }

        let height = frame.height();
        let promoted: Vec<Series> = frame
            .get_columns()
            .iter()
            .filter_map(|c| promote(c.as_materialized_series(), height))
            .collect();
        if promoted.is_empty() {
            return Ok((frame, summary));
        }

        for series in promoted {
            tracing::debug!(column = %series.name(), rows = height, "promoted to numeric");
            summary.promoted.push(series.name().to_string());
            frame.with_column(series)?;
        }
    }
}

fn non_blank_rows(frame: &DataFrame) -> Vec<bool> {
    let mut keep = vec![false; frame.height()];
    for column in frame.get_columns() {
        for (row, present) in present_cells(column.as_materialized_series())
            .into_iter()
            .enumerate()
        {
            keep[row] |= present;
        }
    }
    keep
}

fn promote(series: &Series, row_count: usize) -> Option<Series> {
    let values = series.str().ok()?;
    if row_count == 0 {
        return None;
    }
    let parsed: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| v.and_then(parse_numeric_cell))
        .collect();
    let count = parsed.iter().filter(|v| v.is_some()).count();
    (count * 2 > row_count).then(|| Series::new(series.name().clone(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{float_values, numeric_column, text_column};

    fn text(name: &str, values: &[Option<&str>]) -> Series {
        text_column(name, values.to_vec())
    }

    #[test]
    fn parse_numeric_cell_strips_symbols() {
        assert_eq!(parse_numeric_cell("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_numeric_cell(" $12.50 "), Some(12.5));
        assert_eq!(parse_numeric_cell("45%"), Some(45.0));
        assert_eq!(parse_numeric_cell("-3"), Some(-3.0));
        assert_eq!(parse_numeric_cell(""), None);
        assert_eq!(parse_numeric_cell("$"), None);
        assert_eq!(parse_numeric_cell("GOLD"), None);
        assert_eq!(parse_numeric_cell("NaN"), None);
        assert_eq!(parse_numeric_cell("inf"), None);
    }

    #[test]
    fn drops_fully_blank_rows() {
        let ds = Dataset::new(vec![
            text("a", &[Some("x"), None, Some("  ")]),
            text("b", &[None, Some(""), None]),
        ])
        .unwrap();
        let (out, summary) = normalize_with_summary(ds);
        assert_eq!(out.row_count(), 1);
        assert_eq!(summary.dropped_rows, 2);
    }

    #[test]
    fn exactly_half_is_not_promoted() {
        let ds = Dataset::new(vec![text(
            "c",
            &[Some("1"), Some("2"), Some("x"), Some("y")],
        )])
        .unwrap();
        let out = normalize(ds);
        assert!(!out.is_numeric("c"));
    }

    #[test]
    fn one_over_half_is_promoted() {
        let ds = Dataset::new(vec![
            text("c", &[Some("1"), Some("2"), Some("3"), Some("y")]),
            text("m", &[Some("a"), Some("b"), Some("c"), Some("d")]),
        ])
        .unwrap();
        let (out, summary) = normalize_with_summary(ds);
        assert_eq!(summary.promoted, vec!["c".to_string()]);
        assert_eq!(summary.dropped_rows, 0);
        assert_eq!(
            float_values(out.column("c").unwrap()),
            Some(vec![Some(1.0), Some(2.0), Some(3.0), None])
        );
    }

    #[test]
    fn row_left_with_only_an_unparseable_promoted_cell_is_dropped() {
        let ds = Dataset::new(vec![text(
            "c",
            &[Some("1"), Some("2"), Some("3"), Some("y")],
        )])
        .unwrap();
        let (out, summary) = normalize_with_summary(ds);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(
            float_values(out.column("c").unwrap()),
            Some(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
    }

    #[test]
    fn missing_cells_count_against_promotion() {
        let ds = Dataset::new(vec![
            text("m", &[Some("a"), Some("b"), Some("c")]),
            text("n", &[Some("1"), None, None]),
        ])
        .unwrap();
        let out = normalize(ds);
        assert!(!out.is_numeric("n"));
    }

    #[test]
    fn text_columns_are_kept_verbatim() {
        let ds = Dataset::new(vec![text("m", &[Some(" GOLD "), Some("1,000")])]).unwrap();
        let out = normalize(ds.clone());
        assert_eq!(out, ds);
    }

    #[test]
    fn numeric_columns_are_untouched() {
        let ds = Dataset::new(vec![
            numeric_column("n", vec![Some(1.0), None]),
            text("m", &[Some("a"), Some("b")]),
        ])
        .unwrap();
        assert_eq!(normalize(ds.clone()), ds);
    }

    #[test]
    fn rows_emptied_by_promotion_are_dropped_and_idempotent() {
        // Row 3 holds only an unparseable value in a column that gets promoted.
        let ds = Dataset::new(vec![
            text("n", &[Some("1"), Some("2"), Some("3"), Some("oops")]),
            text("t", &[Some("1"), Some("a"), None, None]),
        ])
        .unwrap();
        let (once, summary) = normalize_with_summary(ds);
        assert_eq!(summary.promoted, vec!["n".to_string()]);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(once.row_count(), 3);
        assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn empty_dataset_is_a_fixed_point() {
        let ds = Dataset::default();
        assert_eq!(normalize(ds.clone()), ds);
        let no_rows = Dataset::new(vec![text("a", &[])]).unwrap();
        assert_eq!(normalize(no_rows.clone()), no_rows);
    }
}
