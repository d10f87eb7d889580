//! Blocking HTTP client backed by `reqwest`.

use super::provider::{DataError, HttpClient, HttpResponse};
use std::time::Duration;

/// [`HttpClient`] over a shared `reqwest::blocking::Client`.
///
/// The timeout is applied per request so CSV and bulk downloads can use
/// different bounds through the same connection pool.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Transport {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, DataError> {
        let transport = |e: reqwest::Error| DataError::Transport {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("timed out after {}s", timeout.as_secs())
            } else {
                e.to_string()
            },
        };

        let resp = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .map_err(transport)?;

        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(transport)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
