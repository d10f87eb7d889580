//! COT report families and their upstream identifiers.

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of report types understood by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Legacy, futures only.
    LegacyFut,
    /// Legacy, futures and options combined.
    LegacyCombined,
    /// Disaggregated, futures only.
    DisaggregatedFut,
    /// Traders in Financial Futures, futures only.
    TffFut,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::LegacyFut,
        ReportType::LegacyCombined,
        ReportType::DisaggregatedFut,
        ReportType::TffFut,
    ];

    /// Wire token, e.g. `legacy_fut`.
    pub fn token(self) -> &'static str {
        match self {
            ReportType::LegacyFut => "legacy_fut",
            ReportType::LegacyCombined => "legacy_combined",
            ReportType::DisaggregatedFut => "disaggregated_fut",
            ReportType::TffFut => "tff_fut",
        }
    }

    /// CFTC public reporting dataset identifier (used by both the JSON API
    /// and the bulk CSV download).
    pub fn dataset_id(self) -> &'static str {
        match self {
            ReportType::LegacyFut => "6dca-aqww",
            ReportType::LegacyCombined => "jun7-fc8e",
            ReportType::DisaggregatedFut => "kh3c-gbw2",
            ReportType::TffFut => "yw9f-hn96",
        }
    }

    /// Report name used by the historical yearly archives.
    pub fn history_name(self) -> &'static str {
        match self {
            ReportType::LegacyFut => "legacy_fut",
            ReportType::LegacyCombined => "legacy_futopt",
            ReportType::DisaggregatedFut => "disaggregated_fut",
            ReportType::TffFut => "traders_in_financial_futures_fut",
        }
    }

    /// File name of the yearly zip archive for this report.
    pub fn archive_file(self, year: i32) -> String {
        match self {
            ReportType::LegacyFut => format!("deacot{year}.zip"),
            ReportType::LegacyCombined => format!("deahistfo{year}.zip"),
            ReportType::DisaggregatedFut => format!("fut_disagg_txt_{year}.zip"),
            ReportType::TffFut => format!("fut_fin_txt_{year}.zip"),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ReportType::LegacyFut => "Legacy Futures Only (1986-Present)",
            ReportType::LegacyCombined => "Legacy Combined - Futures + Options (1986-Present)",
            ReportType::DisaggregatedFut => "Disaggregated Futures (2009-Present)",
            ReportType::TffFut => "Financial Futures (2009-Present)",
        }
    }
}

impl FromStr for ReportType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|r| r.token() == s)
            .ok_or_else(|| DataError::UnknownReportType(s.to_string()))
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_from_str() {
        for rt in ReportType::ALL {
            assert_eq!(rt.token().parse::<ReportType>().unwrap(), rt);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "legacy_options".parse::<ReportType>().unwrap_err();
        assert!(matches!(err, DataError::UnknownReportType(t) if t == "legacy_options"));
    }

    #[test]
    fn upstream_identifiers_are_distinct() {
        let mut ids: Vec<&str> = ReportType::ALL.iter().map(|r| r.dataset_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        let mut names: Vec<&str> = ReportType::ALL.iter().map(|r| r.history_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn archive_file_names() {
        assert_eq!(ReportType::LegacyFut.archive_file(2024), "deacot2024.zip");
        assert_eq!(ReportType::TffFut.archive_file(2019), "fut_fin_txt_2019.zip");
    }

    #[test]
    fn serde_uses_wire_tokens() {
        let json = serde_json::to_string(&ReportType::DisaggregatedFut).unwrap();
        assert_eq!(json, "\"disaggregated_fut\"");
    }
}
