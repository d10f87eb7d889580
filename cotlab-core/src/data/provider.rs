//! Source specifications, structured error types and the provider traits.
//!
//! [`RecordSource`] abstracts over the adapter so callers (the session, the
//! CLI) can be driven by a test double. [`HttpClient`] and
//! [`HistoricalProvider`] are the two inbound collaborators the adapter
//! depends on.

use super::report_type::ReportType;
use crate::domain::{Dataset, RawTable};
use crate::normalize::normalize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Structured error types for fetch operations.
///
/// Every variant is recoverable: the caller may retry with another source.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("empty payload from {0}")]
    EmptyPayload(String),

    #[error("no rows parsed from {0}")]
    EmptyTable(String),

    #[error("malformed table from {origin}: {reason}")]
    MalformedTable { origin: String, reason: String },

    #[error(
        "unknown report type '{0}' (expected one of: legacy_fut, legacy_combined, disaggregated_fut, tff_fut)"
    )]
    UnknownReportType(String),
}

impl DataError {
    pub fn malformed(origin: &str, reason: impl ToString) -> Self {
        DataError::MalformedTable {
            origin: origin.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Network, timeout or non-2xx failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DataError::Transport { .. } | DataError::HttpStatus { .. }
        )
    }
}

/// Where to load a dataset from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Any CSV document reachable over HTTP.
    CsvUrl { url: String },
    /// CFTC public reporting JSON API.
    CftcApi {
        report_type: ReportType,
        limit: usize,
        order: String,
    },
    /// CFTC full-history CSV download for one report.
    BulkCsv { report_type: ReportType },
    /// One year of a report from the historical archive provider.
    HistoricalYear { year: i32, report_type: ReportType },
    /// A CSV file on local disk, parsed like `CsvUrl`.
    CsvFile { path: PathBuf },
}

impl SourceSpec {
    pub fn csv_url(url: impl Into<String>) -> Self {
        SourceSpec::CsvUrl { url: url.into() }
    }

    pub fn csv_file(path: impl Into<PathBuf>) -> Self {
        SourceSpec::CsvFile { path: path.into() }
    }

    /// Fails with [`DataError::UnknownReportType`] before anything is fetched.
    pub fn cftc_api(report_type: &str, limit: usize, order: impl Into<String>) -> Result<Self, DataError> {
        Ok(SourceSpec::CftcApi {
            report_type: report_type.parse()?,
            limit,
            order: order.into(),
        })
    }

    pub fn bulk_csv(report_type: &str) -> Result<Self, DataError> {
        Ok(SourceSpec::BulkCsv {
            report_type: report_type.parse()?,
        })
    }

    pub fn historical_year(year: i32, report_type: &str) -> Result<Self, DataError> {
        Ok(SourceSpec::HistoricalYear {
            year,
            report_type: report_type.parse()?,
        })
    }

    /// Short human-readable label for progress and log lines.
    pub fn describe(&self) -> String {
        match self {
            SourceSpec::CsvUrl { url } => format!("csv {url}"),
            SourceSpec::CftcApi {
                report_type, limit, ..
            } => format!("cftc api {report_type} (limit {limit})"),
            SourceSpec::BulkCsv { report_type } => format!("cftc bulk csv {report_type}"),
            SourceSpec::HistoricalYear { year, report_type } => {
                format!("cftc history {report_type} {year}")
            }
            SourceSpec::CsvFile { path } => format!("file {}", path.display()),
        }
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking `GET url [params] [timeout]`.
///
/// Implementations report network failures and timeouts as
/// [`DataError::Transport`]; status codes are returned as-is.
pub trait HttpClient {
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, DataError>;
}

/// Yearly historical report rows from a third-party archive.
pub trait HistoricalProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch_year(&self, year: i32, report_type: ReportType) -> Result<RawTable, DataError>;
}

/// Anything that can turn a [`SourceSpec`] into a dataset.
pub trait RecordSource {
    /// Fetch and canonicalize, without type normalization.
    fn fetch(&self, spec: &SourceSpec) -> Result<Dataset, DataError>;

    /// Fetch, canonicalize and normalize.
    fn load(&self, spec: &SourceSpec) -> Result<Dataset, DataError> {
        self.fetch(spec).map(normalize)
    }
}

/// Issue a GET and return the body of a 2xx response with content.
pub(crate) fn fetch_body(
    client: &dyn HttpClient,
    url: &str,
    query: &[(&str, String)],
    timeout: Duration,
) -> Result<Vec<u8>, DataError> {
    tracing::debug!(url, ?query, timeout_secs = timeout.as_secs(), "GET");
    let response = client.get(url, query, timeout)?;
    if !response.is_success() {
        return Err(DataError::HttpStatus {
            status: response.status,
            url: url.to_string(),
        });
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Err(DataError::EmptyPayload(url.to_string()));
    }
    tracing::debug!(url, bytes = response.body.len(), "response received");
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_constructors_validate_report_type() {
        assert!(matches!(
            SourceSpec::cftc_api("bogus", 10, "x"),
            Err(DataError::UnknownReportType(_))
        ));
        assert!(matches!(
            SourceSpec::bulk_csv("LEGACY_FUT"),
            Err(DataError::UnknownReportType(_))
        ));
        assert_eq!(
            SourceSpec::historical_year(2024, "tff_fut").unwrap(),
            SourceSpec::HistoricalYear {
                year: 2024,
                report_type: ReportType::TffFut
            }
        );
    }

    #[test]
    fn transport_classification() {
        assert!(DataError::HttpStatus {
            status: 503,
            url: "u".into()
        }
        .is_transport());
        assert!(!DataError::EmptyPayload("u".into()).is_transport());
    }

    #[test]
    fn response_success_range() {
        let ok = HttpResponse { status: 204, body: vec![] };
        let redirect = HttpResponse { status: 302, body: vec![] };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
