//! Data retrieval: providers, payload parsing and canonicalization.

pub mod adapter;
pub mod canonicalize;
pub mod history;
pub mod http;
pub mod parse;
pub mod provider;
pub mod report_type;

pub use adapter::SourceAdapter;
pub use canonicalize::{iso_to_display, parse_iso_date, Canonicalizer, HISTORICAL_ALIASES};
pub use history::CftcArchive;
pub use http::ReqwestClient;
pub use provider::{
    DataError, HistoricalProvider, HttpClient, HttpResponse, RecordSource, SourceSpec,
};
pub use report_type::ReportType;
