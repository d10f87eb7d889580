//! Column canonicalization: provider column names → canonical COT fields,
//! plus derivation of the display date from the ISO report date.

use crate::domain::fields::{self, REPORT_DATE_DISPLAY, REPORT_DATE_ISO};
use crate::domain::{RawTable, RawValue};
use chrono::NaiveDate;

/// Column names used by the yearly historical archives.
pub const HISTORICAL_ALIASES: &[(&str, &str)] = &[
    ("Market and Exchange Names", fields::MARKET),
    ("As of Date in Form YYYY-MM-DD", fields::REPORT_DATE_ISO),
    ("Commercial Positions-Long (All)", fields::COMM_LONG),
    ("Commercial Positions-Short (All)", fields::COMM_SHORT),
    ("Noncommercial Positions-Long (All)", fields::NONCOMM_LONG),
    ("Noncommercial Positions-Short (All)", fields::NONCOMM_SHORT),
    ("Nonreportable Positions-Long (All)", fields::NONREPT_LONG),
    ("Nonreportable Positions-Short (All)", fields::NONREPT_SHORT),
];

/// Renames provider columns to canonical names and derives the display date.
pub struct Canonicalizer {
    aliases: &'static [(&'static str, &'static str)],
}

impl Canonicalizer {
    pub fn new(aliases: &'static [(&'static str, &'static str)]) -> Self {
        Self { aliases }
    }

    /// Canonicalize a raw table:
    ///
    /// 1. alias renames (exact provider names),
    /// 2. case-insensitive matches of canonical names,
    /// 3. ISO report dates trimmed to `YYYY-MM-DD`,
    /// 4. `Report_Date_as_MM_DD_YYYY` derived from the ISO date.
    ///
    /// A rename never overwrites a canonical column that is already present,
    /// and fields the source does not provide stay absent.
    pub fn canonicalize(&self, mut table: RawTable) -> RawTable {
        for (from, to) in self.aliases {
            if table.has_column(to) {
                continue;
            }
            if let Some(index) = table.column_index(from) {
                table.rename_column(index, to);
            }
        }

        for index in 0..table.columns().len() {
            let name = table.columns()[index].clone();
            if let Some(canonical) = fields::canonical_match(&name) {
                if canonical != name && !table.has_column(canonical) {
                    tracing::debug!(from = %name, to = canonical, "renamed column");
                    table.rename_column(index, canonical);
                }
            }
        }

        if let Some(iso_index) = table.column_index(REPORT_DATE_ISO) {
            table.map_column(iso_index, |cell| match cell.as_text() {
                Some(text) => match parse_iso_date(&text) {
                    Some(date) => RawValue::Text(date.format("%Y-%m-%d").to_string()),
                    None => cell.clone(),
                },
                None => RawValue::Missing,
            });

            let derived: Vec<RawValue> = table
                .column_values(iso_index)
                .map(|cell| {
                    cell.as_text()
                        .and_then(|text| iso_to_display(&text))
                        .map_or(RawValue::Missing, RawValue::Text)
                })
                .collect();

            match table.column_index(REPORT_DATE_DISPLAY) {
                // Keep a provider display date only where the ISO date is unusable.
                Some(display_index) => {
                    let mut derived = derived.into_iter();
                    table.map_column(display_index, |existing| match derived.next() {
                        Some(RawValue::Missing) | None => existing.clone(),
                        Some(value) => value,
                    });
                }
                None => table.push_column(REPORT_DATE_DISPLAY, derived),
            }
        }

        table
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(HISTORICAL_ALIASES)
    }
}

/// Parse an ISO `YYYY-MM-DD` date, tolerating a trailing time component
/// (`2024-03-19T00:00:00.000` or `2024-03-19 00:00:00`).
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = match value.char_indices().nth(10) {
        Some((i, 'T')) | Some((i, ' ')) => &value[..i],
        Some(_) => return None,
        None => value,
    };
    if date_part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Reformat an ISO report date as the `MM/DD/YYYY` display date.
///
/// `iso_to_display("2024-03-19") == Some("03/19/2024")`. Locale independent.
pub fn iso_to_display(iso: &str) -> Option<String> {
    parse_iso_date(iso).map(|d| d.format("%m/%d/%Y").to_string())
}
