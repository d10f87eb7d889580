//! Canonical COT field names.
//!
//! These exact, case-sensitive strings are the contract between the source
//! adapters and every downstream consumer. Renaming any of them breaks
//! compatibility with datasets produced by the adapters.

pub const MARKET: &str = "Market_and_Exchange_Names";
pub const REPORT_DATE_ISO: &str = "Report_Date_as_YYYY_MM_DD";
pub const REPORT_DATE_DISPLAY: &str = "Report_Date_as_MM_DD_YYYY";

pub const COMM_LONG: &str = "Comm_Positions_Long_All";
pub const COMM_SHORT: &str = "Comm_Positions_Short_All";
pub const NONCOMM_LONG: &str = "NonComm_Positions_Long_All";
pub const NONCOMM_SHORT: &str = "NonComm_Positions_Short_All";
pub const NONREPT_LONG: &str = "NonRept_Positions_Long_All";
pub const NONREPT_SHORT: &str = "NonRept_Positions_Short_All";

/// The six position counts, in canonical order (long/short per category).
pub const POSITION_FIELDS: [&str; 6] = [
    COMM_LONG,
    COMM_SHORT,
    NONCOMM_LONG,
    NONCOMM_SHORT,
    NONREPT_LONG,
    NONREPT_SHORT,
];

/// Every canonical field, identity key first.
pub const CANONICAL_FIELDS: [&str; 9] = [
    MARKET,
    REPORT_DATE_ISO,
    REPORT_DATE_DISPLAY,
    COMM_LONG,
    COMM_SHORT,
    NONCOMM_LONG,
    NONCOMM_SHORT,
    NONREPT_LONG,
    NONREPT_SHORT,
];

/// Trader category of a net position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraderCategory {
    /// Hedgers.
    Commercial,
    /// Large speculators.
    NonCommercial,
    /// Small traders below the reporting threshold.
    NonReportable,
}

impl TraderCategory {
    pub const ALL: [TraderCategory; 3] = [
        TraderCategory::Commercial,
        TraderCategory::NonCommercial,
        TraderCategory::NonReportable,
    ];

    /// The (long, short) canonical field pair for this category.
    pub fn fields(self) -> (&'static str, &'static str) {
        match self {
            TraderCategory::Commercial => (COMM_LONG, COMM_SHORT),
            TraderCategory::NonCommercial => (NONCOMM_LONG, NONCOMM_SHORT),
            TraderCategory::NonReportable => (NONREPT_LONG, NONREPT_SHORT),
        }
    }

    /// Chart label used by the display layer.
    pub fn label(self) -> &'static str {
        match self {
            TraderCategory::Commercial => "Commercials",
            TraderCategory::NonCommercial => "Large Speculators",
            TraderCategory::NonReportable => "Small Speculators",
        }
    }
}

/// Returns the canonical spelling of `name` if it matches a canonical field
/// ignoring ASCII case.
pub fn canonical_match(name: &str) -> Option<&'static str> {
    CANONICAL_FIELDS
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(name.trim()))
}
