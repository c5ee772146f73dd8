//! Embed-then-search retrieval pipeline.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::{AdapterError, Embedder, Neighbor, VectorIndex};

/// Errors produced while retrieving hits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(#[source] AdapterError),

    #[error("malformed embedding: {0}")]
    MalformedEmbedding(String),

    #[error("vector index unavailable: {0}")]
    IndexUnavailable(#[source] AdapterError),
}

/// Free text plus the number of hits wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub top_k: NonZeroUsize,
}

impl Query {
    pub fn new(text: impl Into<String>, top_k: NonZeroUsize) -> Self {
        Self {
            text: text.into(),
            top_k,
        }
    }
}

/// One ranked retrieval result.
///
/// Serialized as `{"id": .., "score": .., "payload": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Point id as text. Numeric index ids are stringified too, so equal
    /// scores order by the string: `"10"` comes before `"9"`.
    pub id: String,
    /// Higher is more similar.
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

impl From<Neighbor> for Hit {
    fn from(n: Neighbor) -> Self {
        Hit {
            id: n.id,
            score: n.score,
            payload: n.payload,
        }
    }
}

/// Turns a [`Query`] into hits ordered by descending score, ties by ascending id.
#[derive(Clone)]
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    dimensions: Option<usize>,
}

impl RetrievalPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            dimensions: None,
        }
    }

    /// Reject embeddings whose length differs from `dimensions`.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub async fn retrieve(&self, query: &Query) -> Result<Vec<Hit>, RetrievalError> {
        let vector = self
            .embedder
            .embed(&query.text)
            .await
            .map_err(RetrievalError::Embedding)?;
        self.check_vector(&vector)?;

        let top_k = query.top_k.get();
        let neighbors = self
            .index
            .search(&vector, top_k)
            .await
            .map_err(RetrievalError::IndexUnavailable)?;

        tracing::debug!(
            "Index returned {} neighbors for top_k={}",
            neighbors.len(),
            top_k
        );

        Ok(rank(neighbors, top_k))
    }

    fn check_vector(&self, vector: &[f32]) -> Result<(), RetrievalError> {
        if vector.is_empty() {
            return Err(RetrievalError::MalformedEmbedding("empty vector".into()));
        }
        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(RetrievalError::MalformedEmbedding(format!(
                    "expected {} dimensions, got {}",
                    expected,
                    vector.len()
                )));
            }
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(RetrievalError::MalformedEmbedding(format!(
                "non-finite component at index {}",
                pos
            )));
        }
        Ok(())
    }
}

/// Normalize raw neighbors: drop non-finite scores, order, truncate.
fn rank(neighbors: Vec<Neighbor>, top_k: usize) -> Vec<Hit> {
    neighbors
        .into_iter()
        .filter(|n| n.score.is_finite())
        .map(Hit::from)
        .sorted_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)))
        .take(top_k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(id: &str, score: f32) -> Neighbor {
        Neighbor {
            id: id.to_string(),
            score,
            payload: Value::Null,
        }
    }

    fn ids(hits: &[Hit]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn rank_orders_by_score_then_id() {
        let hits = rank(
            vec![
                neighbor("c", 0.5),
                neighbor("b", 0.9),
                neighbor("a", 0.5),
                neighbor("d", 0.1),
            ],
            10,
        );
        assert_eq!(ids(&hits), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn numeric_ids_tie_break_as_text() {
        let hits = rank(vec![neighbor("9", 0.5), neighbor("10", 0.5)], 2);
        assert_eq!(ids(&hits), vec!["10", "9"]);
    }

    #[test]
    fn rank_truncates_to_top_k() {
        let hits = rank(
            vec![neighbor("a", 0.1), neighbor("b", 0.2), neighbor("c", 0.3)],
            2,
        );
        assert_eq!(ids(&hits), vec!["c", "b"]);
    }

    #[test]
    fn rank_drops_non_finite_scores() {
        let hits = rank(
            vec![neighbor("a", f32::NAN), neighbor("b", 0.2), neighbor("c", f32::INFINITY)],
            5,
        );
        assert_eq!(ids(&hits), vec!["b"]);
    }

    #[test]
    fn rank_of_nothing_is_empty() {
        assert!(rank(Vec::new(), 3).is_empty());
    }
}
