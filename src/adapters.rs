//! Narrow clients for the external services the gateway depends on.
//!
//! Each adapter exposes a single operation with a bounded timeout. Adapters
//! never retry; callers decide what a failure means for them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Outcome of a failed adapter call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error("request timed out")]
    Timeout,

    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The service answered 2xx with a body we could not make sense of.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl AdapterError {
    /// Whether the service could not be reached in time, as opposed to
    /// answering with something we reject.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AdapterError::Timeout | AdapterError::Unreachable(_))
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_decode() {
            AdapterError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            AdapterError::Rejected {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            AdapterError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Malformed(err.to_string())
    }
}

/// Query parameters sent to the record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub area: String,
    pub city: String,
}

impl RecordQuery {
    pub fn new(area: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            city: city.into(),
        }
    }
}

/// One raw neighbor as returned by a vector index, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

/// Upstream API that serves raw records for an area.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the records for `query`. The body is returned as opaque JSON.
    async fn fetch(&self, query: &RecordQuery) -> Result<Value, AdapterError>;
}

/// Provider that turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdapterError>;
}

/// Provider that generates text from an optional system instruction and user content.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        user_content: &str,
    ) -> Result<String, AdapterError>;
}

/// Nearest-neighbor search over stored vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` neighbors of `vector` under the index's own metric.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<Neighbor>, AdapterError>;
}

pub mod openai;
pub mod qdrant;
pub mod record_source;

pub use openai::OpenAiProvider;
pub use qdrant::QdrantIndex;
pub use record_source::HttpRecordSource;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_unreachable_count_as_unavailable() {
        assert!(AdapterError::Timeout.is_unavailable());
        assert!(AdapterError::Unreachable("refused".into()).is_unavailable());
        assert!(!AdapterError::Rejected {
            status: 404,
            body: String::new()
        }
        .is_unavailable());
        assert!(!AdapterError::Malformed("eof".into()).is_unavailable());
    }

    #[test]
    fn neighbor_payload_defaults_to_null() {
        let neighbor: Neighbor = serde_json::from_str(r#"{"id":"a","score":0.5}"#).unwrap();
        assert_eq!(neighbor.payload, Value::Null);
    }
}
