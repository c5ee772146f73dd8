//! Gateway configuration and wiring.
//!
//! Loading values from the environment or a secrets store is left to the
//! embedding application; this module only describes what is needed and how
//! the pieces are put together.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::openai::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use crate::adapters::qdrant::DEFAULT_COLLECTION;
use crate::adapters::record_source::DEFAULT_RECORD_SOURCE_TIMEOUT;
use crate::adapters::{HttpRecordSource, OpenAiProvider, QdrantIndex};
use crate::dispatcher::{Dispatcher, RegistryError, ToolRegistry, DEFAULT_INVOCATION_DEADLINE};
use crate::gateway::Gateway;
use crate::mcp::McpServer;
use crate::options::{ModelOptions, TransportOptions, DEFAULT_ADAPTER_TIMEOUT};
use crate::retrieval::RetrievalPipeline;
use crate::tools::builtin::{register_builtin_tools, BuiltinServices};

/// Errors raised while wiring the gateway.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("configuration error: {0}")]
    Invalid(String),
}

/// Everything needed to build a [`Gateway`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Record-source endpoint queried with `area` and `city`.
    pub record_source_url: String,
    pub record_source_timeout_secs: u64,

    pub provider_base_url: String,
    pub provider_api_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    /// Expected embedding length; vectors of any other length are rejected.
    pub embedding_dimensions: Option<usize>,

    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub qdrant_collection: String,

    /// Timeout enforced by the provider and index adapters.
    pub adapter_timeout_secs: u64,
    /// Overall deadline for one top-level tool invocation, chain included.
    pub invocation_deadline_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            record_source_url: String::new(),
            record_source_timeout_secs: DEFAULT_RECORD_SOURCE_TIMEOUT.as_secs(),
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            provider_api_key: String::new(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_dimensions: None,
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
            qdrant_collection: DEFAULT_COLLECTION.to_string(),
            adapter_timeout_secs: DEFAULT_ADAPTER_TIMEOUT.as_secs(),
            invocation_deadline_secs: DEFAULT_INVOCATION_DEADLINE.as_secs(),
        }
    }
}

/// The wired services, sharing one dispatcher.
#[derive(Clone)]
pub struct Services {
    pub gateway: Gateway,
    pub mcp: McpServer,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.record_source_url.is_empty() {
            return Err(ConfigError::Invalid("record_source_url is required".into()));
        }
        if self.provider_api_key.is_empty() {
            return Err(ConfigError::Invalid("provider_api_key is required".into()));
        }
        if self.adapter_timeout_secs == 0 || self.record_source_timeout_secs == 0 {
            return Err(ConfigError::Invalid("adapter timeouts must be positive".into()));
        }
        if self.invocation_deadline_secs == 0 {
            return Err(ConfigError::Invalid(
                "invocation_deadline_secs must be positive".into(),
            ));
        }
        if self.embedding_dimensions == Some(0) {
            return Err(ConfigError::Invalid(
                "embedding_dimensions must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Build adapters, register the built-in tools and freeze the dispatcher.
    pub fn build(&self) -> Result<Services, ConfigError> {
        self.validate()?;

        let adapter_transport =
            TransportOptions::new().with_timeout(Duration::from_secs(self.adapter_timeout_secs));

        let records = Arc::new(HttpRecordSource::with_options(
            &self.record_source_url,
            TransportOptions::new()
                .with_timeout(Duration::from_secs(self.record_source_timeout_secs)),
        )?);

        let provider = Arc::new(OpenAiProvider::with_options(
            &self.provider_api_key,
            &self.provider_base_url,
            &self.embedding_model,
            ModelOptions::new(&self.chat_model),
            adapter_transport.clone(),
        )?);

        let index = Arc::new(QdrantIndex::with_options(
            &self.qdrant_url,
            &self.qdrant_collection,
            self.qdrant_api_key.clone(),
            adapter_transport,
        )?);

        let mut pipeline = RetrievalPipeline::new(provider.clone(), index);
        if let Some(dimensions) = self.embedding_dimensions {
            pipeline = pipeline.with_dimensions(dimensions);
        }
        let pipeline = Arc::new(pipeline);

        let mut registry = ToolRegistry::new();
        register_builtin_tools(
            &mut registry,
            BuiltinServices {
                records,
                generator: provider.clone(),
                pipeline: pipeline.clone(),
            },
        )?;

        let dispatcher = Arc::new(
            Dispatcher::new(registry)
                .with_deadline(Duration::from_secs(self.invocation_deadline_secs)),
        );

        tracing::info!(
            tools = dispatcher.list_tools().len(),
            collection = %self.qdrant_collection,
            "Gateway configured"
        );

        Ok(Services {
            gateway: Gateway::new(dispatcher.clone(), pipeline, provider),
            mcp: McpServer::new(dispatcher),
        })
    }
}
