//! Net position derivation: long minus short per trader category, for one
//! market, in report-date order.

use crate::domain::fields::{MARKET, POSITION_FIELDS, REPORT_DATE_DISPLAY};
use crate::domain::{format_number, text_values, Dataset, TraderCategory};
use crate::normalize::parse_numeric_cell;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{
    BooleanChunked, DataFrame, IntoLazy, NamedFrom, NewChunkedArray, PolarsError, Series,
    SortMultipleOptions,
};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    #[error("frame operation failed: {0}")]
    Frame(String),
}

impl From<PolarsError> for DeriveError {
    fn from(e: PolarsError) -> Self {
        DeriveError::Frame(e.to_string())
    }
}

/// How the report dates of a series were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateParse {
    /// Every present date matched `MM/DD/YYYY`.
    Exact,
    /// Exact parsing failed; a multi-format parse succeeded.
    Flexible,
    /// Both parses failed. Points keep input order.
    Unparsed,
}

/// Non-fatal: dates could not be parsed, so the series is not guaranteed to
/// be chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParseDegraded {
    pub column: String,
    pub reason: String,
}

/// One report row of a market's net positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetPositionPoint {
    /// Row index in the source dataset.
    pub source_row: usize,
    /// Display date text as found in the dataset.
    pub label: Option<String>,
    pub date: Option<NaiveDate>,
    pub commercial: Option<f64>,
    pub noncommercial: Option<f64>,
    pub nonreportable: Option<f64>,
}

impl NetPositionPoint {
    pub fn net(&self, category: TraderCategory) -> Option<f64> {
        match category {
            TraderCategory::Commercial => self.commercial,
            TraderCategory::NonCommercial => self.noncommercial,
            TraderCategory::NonReportable => self.nonreportable,
        }
    }

    /// Parsed date as `MM/DD/YYYY`, falling back to the raw label.
    pub fn date_label(&self) -> String {
        match (self.date, &self.label) {
            (Some(d), _) => d.format("%m/%d/%Y").to_string(),
            (None, Some(label)) => label.clone(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetPositionSeries {
    pub market: String,
    pub points: Vec<NetPositionPoint>,
    pub date_parse: DateParse,
    pub degraded: Option<DateParseDegraded>,
}

impl NetPositionSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True unless date parsing degraded and input order was kept.
    pub fn is_chronological(&self) -> bool {
        self.date_parse != DateParse::Unparsed
    }

    /// Defined net values of one category, in series order.
    pub fn defined(&self, category: TraderCategory) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(move |p| p.net(category))
    }

    /// Smallest and largest defined net across all categories.
    pub fn extent(&self) -> Option<(f64, f64)> {
        TraderCategory::ALL
            .iter()
            .flat_map(|&c| self.defined(c))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Most recent point with a parsed date.
    pub fn latest(&self) -> Option<&NetPositionPoint> {
        if !self.is_chronological() {
            return None;
        }
        self.points.iter().rev().find(|p| p.date.is_some())
    }

    /// Write the series as CSV. Undefined nets are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "date",
            "commercial_net",
            "noncommercial_net",
            "nonreportable_net",
        ])?;
        for p in &self.points {
            let cell = |v: Option<f64>| v.map(format_number).unwrap_or_default();
            wtr.write_record([
                p.date_label(),
                cell(p.commercial),
                cell(p.noncommercial),
                cell(p.nonreportable),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Derive the net position series of `market`.
///
/// Rows are matched on the exact market name. The six position columns must
/// exist (checked before any row is parsed). Text position cells are coerced
/// per cell with [`parse_numeric_cell`]; an unparseable operand leaves only
/// that category's net undefined for that row.
///
/// Dates are parsed from `Report_Date_as_MM_DD_YYYY`, exact format first,
/// then a flexible parse. If both fail the series keeps dataset order and
/// carries a [`DateParseDegraded`] note instead of failing. Sorting is
/// stable; rows without a date sort last.
pub fn derive(dataset: &Dataset, market: &str) -> Result<NetPositionSeries, DeriveError> {
    let frame = dataset.frame();
    let rows = match dataset.column(MARKET) {
        Some(column) => {
            let mask: Vec<bool> = text_values(column)
                .iter()
                .map(|name| name.as_deref() == Some(market))
                .collect();
            frame
                .with_row_index(ROW_INDEX.into(), None)?
                .filter(&BooleanChunked::from_slice("market".into(), &mask))?
        }
        None => DataFrame::default(),
    };
    if rows.height() == 0 {
        return Err(DeriveError::MarketNotFound(market.to_string()));
    }

    let schema = frame.schema();
    let missing: Vec<String> = POSITION_FIELDS
        .iter()
        .filter(|f| !schema.contains(f))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DeriveError::MissingRequiredColumns(missing));
    }

    let labels = column_text(&rows, REPORT_DATE_DISPLAY);
    let (dates, date_parse, degraded) = if schema.contains(REPORT_DATE_DISPLAY) {
        parse_dates(&labels)
    } else {
        (
            vec![None; rows.height()],
            DateParse::Unparsed,
            Some(DateParseDegraded {
                column: REPORT_DATE_DISPLAY.to_string(),
                reason: "column not present".to_string(),
            }),
        )
    };
    if let Some(d) = &degraded {
        tracing::warn!(market, reason = %d.reason, "report dates not parsed; keeping input order");
    }

    let mut rows = rows;
    let keys: Vec<Option<i32>> = dates
        .iter()
        .map(|d| d.map(|d| d.num_days_from_ce()))
        .collect();
    rows.with_column(Series::new(DATE_KEY.into(), keys))?;
    if date_parse != DateParse::Unparsed {
        rows = rows
            .lazy()
            .sort(
                [DATE_KEY],
                SortMultipleOptions::default()
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )
            .collect()?;
    }

    let source_rows: Vec<usize> = rows
        .column(ROW_INDEX)?
        .as_materialized_series()
        .idx()?
        .into_iter()
        .map(|i| i.unwrap_or_default() as usize)
        .collect();
    let dates: Vec<Option<NaiveDate>> = rows
        .column(DATE_KEY)?
        .as_materialized_series()
        .i32()?
        .into_iter()
        .map(|k| k.and_then(NaiveDate::from_num_days_from_ce_opt))
        .collect();
    let labels = column_text(&rows, REPORT_DATE_DISPLAY);

    let net = |category: TraderCategory| -> Result<Vec<Option<f64>>, DeriveError> {
        let (long, short) = category.fields();
        let long = operands(&rows, long)?;
        let short = operands(&rows, short)?;
        Ok(long
            .into_iter()
            .zip(short)
            .map(|(l, s)| Some(l? - s?))
            .collect())
    };
    let commercial = net(TraderCategory::Commercial)?;
    let noncommercial = net(TraderCategory::NonCommercial)?;
    let nonreportable = net(TraderCategory::NonReportable)?;

    let points = source_rows
        .into_iter()
        .zip(labels)
        .zip(dates)
        .enumerate()
        .map(|(i, ((source_row, label), date))| NetPositionPoint {
            source_row,
            label,
            date,
            commercial: commercial[i],
            noncommercial: noncommercial[i],
            nonreportable: nonreportable[i],
        })
        .collect();

    Ok(NetPositionSeries {
        market: market.to_string(),
        points,
        date_parse,
        degraded,
    })
}

const ROW_INDEX: &str = "__source_row";
const DATE_KEY: &str = "__date_key";

/// Cells of `name` as text; all missing when the column is absent.
fn column_text(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
    match frame.column(name) {
        Ok(column) => text_values(column.as_materialized_series()),
        Err(_) => vec![None; frame.height()],
    }
}

/// Position counts of one column. Text cells go through
/// [`parse_numeric_cell`] one at a time.
fn operands(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DeriveError> {
    let series = frame.column(name)?.as_materialized_series();
    Ok(match series.f64() {
        Ok(values) => values.into_iter().collect(),
        Err(_) => text_values(series)
            .into_iter()
            .map(|v| v.as_deref().and_then(parse_numeric_cell))
            .collect(),
    })
}

const DISPLAY_FORMAT: &str = "%m/%d/%Y";

const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a date with any of the accepted formats.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    FLEXIBLE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            FLEXIBLE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse every present label with `parse`; `Err` carries the first failure.
fn parse_all(
    labels: &[Option<String>],
    parse: impl Fn(&str) -> Option<NaiveDate>,
) -> Result<Vec<Option<NaiveDate>>, String> {
    labels
        .iter()
        .map(|label| match label.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text).map(Some).ok_or_else(|| text.to_string()),
        })
        .collect()
}

fn parse_dates(
    labels: &[Option<String>],
) -> (Vec<Option<NaiveDate>>, DateParse, Option<DateParseDegraded>) {
    let exact = |s: &str| NaiveDate::parse_from_str(s, DISPLAY_FORMAT).ok();
    match parse_all(labels, exact) {
        Ok(dates) => (dates, DateParse::Exact, None),
        Err(_) => match parse_all(labels, parse_flexible_date) {
            Ok(dates) => (dates, DateParse::Flexible, None),
            Err(bad) => (
                vec![None; labels.len()],
                DateParse::Unparsed,
                Some(DateParseDegraded {
                    column: REPORT_DATE_DISPLAY.to_string(),
                    reason: format!("unrecognized date '{bad}'"),
                }),
            ),
        },
    }
}
