//! The record source adapter: one `fetch` behind every [`SourceSpec`].

use super::canonicalize::Canonicalizer;
use super::history::CftcArchive;
use super::parse::{parse_csv, parse_json_records};
use super::provider::{
    fetch_body, DataError, HistoricalProvider, HttpClient, RecordSource, SourceSpec,
};
use crate::config::CotConfig;
use crate::domain::{Dataset, RawTable};

/// Fetches raw tables from the configured providers and canonicalizes them.
pub struct SourceAdapter<C: HttpClient> {
    client: C,
    history: Option<Box<dyn HistoricalProvider>>,
    canonicalizer: Canonicalizer,
    config: CotConfig,
}

impl<C: HttpClient> SourceAdapter<C> {
    pub fn new(client: C, config: CotConfig) -> Self {
        Self {
            client,
            history: None,
            canonicalizer: Canonicalizer::default(),
            config,
        }
    }

    /// Use `provider` for [`SourceSpec::HistoricalYear`] instead of the
    /// CFTC yearly archives.
    pub fn with_history(mut self, provider: Box<dyn HistoricalProvider>) -> Self {
        self.history = Some(provider);
        self
    }

    pub fn config(&self) -> &CotConfig {
        &self.config
    }

    /// Retrieve the raw, uncanonicalized table for `spec`.
    pub fn fetch_raw(&self, spec: &SourceSpec) -> Result<RawTable, DataError> {
        let http = &self.config.http;
        match spec {
            SourceSpec::CsvUrl { url } => {
                let body = fetch_body(&self.client, url, &[], http.csv_timeout())?;
                parse_csv(&body, url)
            }
            SourceSpec::CsvFile { path } => {
                let origin = path.display().to_string();
                let body = std::fs::read(path).map_err(|e| DataError::Transport {
                    url: origin.clone(),
                    reason: e.to_string(),
                })?;
                parse_csv(&body, &origin)
            }
            SourceSpec::CftcApi {
                report_type,
                limit,
                order,
            } => {
                let url = self.config.api_url(report_type.dataset_id());
                let query = [("$limit", limit.to_string()), ("$order", order.clone())];
                let body = fetch_body(&self.client, &url, &query, http.bulk_timeout())?;
                parse_json_records(&body, &url)
            }
            SourceSpec::BulkCsv { report_type } => {
                let url = self.config.bulk_url(report_type.dataset_id());
                let query = [("accessType", "DOWNLOAD".to_string())];
                let body = fetch_body(&self.client, &url, &query, http.bulk_timeout())?;
                parse_csv(&body, &url)
            }
            SourceSpec::HistoricalYear { year, report_type } => match &self.history {
                Some(provider) => provider.fetch_year(*year, *report_type),
                None => CftcArchive::new(
                    &self.client,
                    self.config.cftc.history_base.clone(),
                    http.bulk_timeout(),
                )
                .fetch_year(*year, *report_type),
            },
        }
    }
}

impl<C: HttpClient> RecordSource for SourceAdapter<C> {
    fn fetch(&self, spec: &SourceSpec) -> Result<Dataset, DataError> {
        let raw = self.fetch_raw(spec)?;
        if raw.is_empty() {
            return Err(DataError::EmptyTable(spec.describe()));
        }
        let canonical = self.canonicalizer.canonicalize(raw);
        let dataset = Dataset::from_raw(&canonical)
            .map_err(|e| DataError::malformed(&spec.describe(), e))?;
        tracing::debug!(
            source = %spec.describe(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "fetched dataset"
        );
        Ok(dataset)
    }
}
