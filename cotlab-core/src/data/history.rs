//! Historical yearly archives published by the CFTC.
//!
//! Each report type has one zip archive per year containing a single
//! comma-separated text file with long-form column names
//! (`Market and Exchange Names`, `As of Date in Form YYYY-MM-DD`, ...).

use super::parse::parse_csv;
use super::provider::{fetch_body, DataError, HistoricalProvider, HttpClient};
use super::report_type::ReportType;
use crate::domain::RawTable;
use std::io::{Cursor, Read};
use std::time::Duration;
use zip::ZipArchive;

/// [`HistoricalProvider`] that downloads and unpacks the yearly zip archives.
pub struct CftcArchive<'a> {
    client: &'a dyn HttpClient,
    base_url: String,
    timeout: Duration,
}

impl<'a> CftcArchive<'a> {
    pub fn new(client: &'a dyn HttpClient, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn archive_url(&self, year: i32, report_type: ReportType) -> String {
        format!("{}{}", self.base_url, report_type.archive_file(year))
    }
}

impl HistoricalProvider for CftcArchive<'_> {
    fn name(&self) -> &str {
        "cftc_history"
    }

    fn fetch_year(&self, year: i32, report_type: ReportType) -> Result<RawTable, DataError> {
        let url = self.archive_url(year, report_type);
        let body = fetch_body(self.client, &url, &[], self.timeout)?;
        let (entry, content) = extract_report(&body, &url)?;
        tracing::debug!(%url, entry, report = report_type.history_name(), "unpacked archive");
        parse_csv(&content, &format!("{url}!{entry}"))
    }
}

/// Read the first `.txt`/`.csv` file out of a zip archive.
pub fn extract_report(archive: &[u8], origin: &str) -> Result<(String, Vec<u8>), DataError> {
    let mut zip =
        ZipArchive::new(Cursor::new(archive)).map_err(|e| DataError::malformed(origin, e))?;

    for i in 0..zip.len() {
        let mut file = zip.by_index(i).map_err(|e| DataError::malformed(origin, e))?;
        let name = file.name().to_string();
        let lower = name.to_ascii_lowercase();
        if file.is_dir() || !(lower.ends_with(".txt") || lower.ends_with(".csv")) {
            continue;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| DataError::malformed(origin, e))?;
        return Ok((name, content));
    }

    Err(DataError::malformed(origin, "archive contains no report file"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::HttpResponse;
    use std::cell::RefCell;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    struct StaticClient {
        response: HttpResponse,
        urls: RefCell<Vec<String>>,
    }

    impl HttpClient for StaticClient {
        fn get(
            &self,
            url: &str,
            _query: &[(&str, String)],
            _timeout: Duration,
        ) -> Result<HttpResponse, DataError> {
            self.urls.borrow_mut().push(url.to_string());
            Ok(self.response.clone())
        }
    }

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for (name, content) in entries {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn fetch_year_unpacks_first_report_file() {
        let archive = zip_with(&[
            ("readme.md", "ignore me"),
            (
                "annual.txt",
                "\"Market and Exchange Names\",\"As of Date in Form YYYY-MM-DD\"\n\"WHEAT\",2024-01-02\n",
            ),
        ]);
        let client = StaticClient {
            response: HttpResponse {
                status: 200,
                body: archive,
            },
            urls: RefCell::new(Vec::new()),
        };
        let provider = CftcArchive::new(&client, "https://example.test/", Duration::from_secs(5));

        let table = provider.fetch_year(2024, ReportType::LegacyFut).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.has_column("Market and Exchange Names"));
        assert_eq!(
            client.urls.borrow().as_slice(),
            &["https://example.test/deacot2024.zip".to_string()]
        );
    }

    #[test]
    fn garbage_archive_is_malformed() {
        let err = extract_report(b"definitely not a zip", "x").unwrap_err();
        assert!(matches!(err, DataError::MalformedTable { .. }));
    }

    #[test]
    fn archive_without_report_is_malformed() {
        let archive = zip_with(&[("notes.md", "hello")]);
        let err = extract_report(&archive, "x").unwrap_err();
        assert!(matches!(err, DataError::MalformedTable { reason, .. } if reason.contains("no report")));
    }

    #[test]
    fn missing_archive_surfaces_http_status() {
        let client = StaticClient {
            response: HttpResponse {
                status: 404,
                body: b"not found".to_vec(),
            },
            urls: RefCell::new(Vec::new()),
        };
        let provider = CftcArchive::new(&client, "https://example.test/", Duration::from_secs(5));
        let err = provider.fetch_year(1970, ReportType::TffFut).unwrap_err();
        assert!(matches!(err, DataError::HttpStatus { status: 404, .. }));
    }
}
