//! HTTP client for the upstream record-source API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::adapters::{AdapterError, RecordQuery, RecordSource};
use crate::http::{add_extra_headers, build_http_client, ResponseExt};
use crate::options::TransportOptions;

/// Timeout used by the record source when none is configured.
pub const DEFAULT_RECORD_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET {url}?area=..&city=..` against a JSON API.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    url: String,
    http: Client,
    transport_options: TransportOptions,
}

impl HttpRecordSource {
    /// Create a record source with the default five second timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(
            url,
            TransportOptions::new().with_timeout(DEFAULT_RECORD_SOURCE_TIMEOUT),
        )
    }

    pub fn with_options(
        url: impl Into<String>,
        transport_options: TransportOptions,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url: url.into(),
            http: build_http_client(&transport_options)?,
            transport_options,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, query: &RecordQuery) -> Result<Value, AdapterError> {
        tracing::debug!("Fetching records for area={} city={}", query.area, query.city);

        let req = self
            .http
            .get(&self.url)
            .query(&[("area", query.area.as_str()), ("city", query.city.as_str())]);
        let req = add_extra_headers(req, &self.transport_options);

        let response = req.send().await?.error_for_status_logged().await?;
        response.json_logged().await
    }
}
