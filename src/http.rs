//! HTTP client utilities shared by the service adapters.

use reqwest::{Client, RequestBuilder, Response};

use crate::adapters::AdapterError;
use crate::options::TransportOptions;

/// Build a pooled HTTP client from transport options.
///
/// The returned client is meant to be built once per adapter and reused, so
/// that connections are checked out of and returned to its pool.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    match transport_options {
        TransportOptions::Http { timeout, proxy, .. } => {
            builder = builder.timeout(*timeout).connect_timeout(*timeout);
            if let Some(proxy_url) = proxy {
                builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
            }
        }
    }

    builder.build()
}

/// Attach the configured extra headers to an outgoing adapter request.
pub fn add_extra_headers(
    request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    let TransportOptions::Http { headers, .. } = transport_options;
    headers
        .iter()
        .flatten()
        .fold(request, |req, (key, value)| req.header(key, value))
}

/// JSON bodies that are traced before they leave the process.
pub trait RequestBuilderExt {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        if let Ok(body) = serde_json::to_string(json) {
            tracing::debug!(bytes = body.len(), "Adapter request body: {}", body);
        }
        self.json(json)
    }
}

/// Traced body access for adapter responses.
#[async_trait::async_trait]
pub trait ResponseExt: Sized {
    async fn text_logged(self) -> Result<String, AdapterError>;

    /// Decode the body as JSON; undecodable bodies are [`AdapterError::Malformed`].
    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, AdapterError>;

    /// Turn a non-2xx response into [`AdapterError::Rejected`] carrying the body.
    async fn error_for_status_logged(self) -> Result<Self, AdapterError>;
}

#[async_trait::async_trait]
impl ResponseExt for Response {
    async fn text_logged(self) -> Result<String, AdapterError> {
        let url = self.url().clone();
        let text = self.text().await?;
        tracing::debug!(%url, bytes = text.len(), "Adapter response body: {}", text);
        Ok(text)
    }

    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, AdapterError> {
        let text = self.text_logged().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn error_for_status_logged(self) -> Result<Self, AdapterError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        let url = self.url().clone();
        let body = self.text_logged().await.unwrap_or_default();
        tracing::warn!(%url, "Upstream answered HTTP {}", status.as_u16());
        Err(AdapterError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
