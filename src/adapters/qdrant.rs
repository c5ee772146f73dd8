//! Qdrant REST client for nearest-neighbor search.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{AdapterError, Neighbor, VectorIndex};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::options::TransportOptions;

pub const DEFAULT_COLLECTION: &str = "default";

/// Searches one Qdrant collection over its REST API.
#[derive(Debug, Clone)]
pub struct QdrantIndex {
    url: String,
    collection: String,
    api_key: Option<String>,
    transport_options: TransportOptions,
    http: Client,
}

impl QdrantIndex {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(url, DEFAULT_COLLECTION, None, TransportOptions::default())
    }

    pub fn with_options(
        url: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
        transport_options: TransportOptions,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key,
            http: build_http_client(&transport_options)?,
            transport_options,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>, AdapterError> {
        let url = format!("{}/collections/{}/points/search", self.url, self.collection);
        tracing::debug!(
            collection = %self.collection,
            limit = limit,
            "Searching vectors"
        );

        let mut req = self.http.post(&url);
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        let req = add_extra_headers(req, &self.transport_options);

        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };

        let response: SearchResponse = req
            .json_logged(&body)
            .send()
            .await?
            .error_for_status_logged()
            .await?
            .json_logged()
            .await?;

        response.result.into_iter().map(ScoredPoint::into_neighbor).collect()
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

impl ScoredPoint {
    /// Qdrant ids are either unsigned integers or UUID strings.
    fn into_neighbor(self) -> Result<Neighbor, AdapterError> {
        let id = match self.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(AdapterError::Malformed(format!(
                    "unsupported point id: {}",
                    other
                )))
            }
        };

        Ok(Neighbor {
            id,
            score: self.score,
            payload: self.payload.unwrap_or(Value::Null),
        })
    }
}
