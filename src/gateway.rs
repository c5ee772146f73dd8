//! Inbound entry point: decodes request envelopes and encodes results.
//!
//! The HTTP listener itself lives outside this crate. It hands request bodies
//! to [`Gateway::handle_mcp`] or [`Gateway::handle_chat`] and writes back
//! whatever JSON they return.

use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::{AdapterError, Generator};
use crate::dispatcher::Dispatcher;
use crate::retrieval::{Hit, Query, RetrievalError, RetrievalPipeline};
use crate::tools::{Arguments, ToolResult};

/// Errors surfaced to the caller of the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No prompt provided")]
    MissingPrompt,

    #[error("invalid request envelope: {0}")]
    InvalidEnvelope(String),

    #[error("generation failed: {0}")]
    Generation(#[from] AdapterError),
}

impl GatewayError {
    /// HTTP status the listener should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::MissingPrompt | GatewayError::InvalidEnvelope(_) => 400,
            GatewayError::Generation(AdapterError::Timeout) => 504,
            GatewayError::Generation(_) => 502,
        }
    }

    /// `{"error": message}`
    pub fn to_response(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[derive(Debug, Deserialize)]
struct ToolEnvelope {
    tool: String,
    #[serde(default)]
    arguments: Arguments,
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    prompt: Option<String>,
}

/// The gateway's view of the core: tool dispatch, retrieval and raw generation.
#[derive(Clone)]
pub struct Gateway {
    dispatcher: Arc<Dispatcher>,
    pipeline: Arc<RetrievalPipeline>,
    generator: Arc<dyn Generator>,
}

impl Gateway {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        pipeline: Arc<RetrievalPipeline>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            dispatcher,
            pipeline,
            generator,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Invoke a tool by name.
    pub async fn dispatch(&self, tool: &str, args: Arguments) -> ToolResult {
        self.dispatcher.invoke(tool, args).await
    }

    /// Retrieve hits directly, without going through the tool layer.
    pub async fn retrieve(
        &self,
        text: &str,
        top_k: NonZeroUsize,
    ) -> Result<Vec<Hit>, RetrievalError> {
        self.pipeline.retrieve(&Query::new(text, top_k)).await
    }

    /// Forward a prompt straight to the generation provider.
    pub async fn chat(&self, prompt: &str) -> Result<String, GatewayError> {
        if prompt.is_empty() {
            return Err(GatewayError::MissingPrompt);
        }

        info!("Raw chat request ({} chars)", prompt.len());
        let response = self.generator.generate(None, prompt).await?;
        Ok(response)
    }

    /// Decode `{"tool": name, "arguments": {...}}`, dispatch it and encode the result.
    pub async fn handle_mcp(&self, body: Value) -> Value {
        let envelope: ToolEnvelope = match serde_json::from_value(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Rejected tool envelope: {}", e);
                return GatewayError::InvalidEnvelope(e.to_string()).to_response();
            }
        };

        debug!("Dispatching tool envelope for {}", envelope.tool);
        let result = self.dispatch(&envelope.tool, envelope.arguments).await;
        json!(result)
    }

    /// Decode `{"prompt": text}` and answer `{"response": text}`.
    pub async fn handle_chat(&self, body: Value) -> Result<Value, GatewayError> {
        let envelope: ChatEnvelope = serde_json::from_value(body)
            .map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))?;
        let prompt = envelope.prompt.ok_or(GatewayError::MissingPrompt)?;

        let response = self.chat(&prompt).await?;
        Ok(json!({ "response": response }))
    }
}
