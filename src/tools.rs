//! Tool system: descriptors, handlers, results and the failure taxonomy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::adapters::AdapterError;
use crate::dispatcher::ToolContext;
use crate::retrieval::RetrievalError;

pub mod builtin;
pub mod schema;

pub use schema::{ArgSchema, ParamSpec, ParamType, ToolArgs};

/// Raw, unvalidated tool arguments.
pub type Arguments = serde_json::Map<String, Value>;

/// Stable failure kinds reported in a failed [`ToolResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownToolError,
    InvalidArgumentError,
    RecursionError,
    DeadlineExceeded,
    EmbeddingError,
    IndexUnavailableError,
    UpstreamUnavailable,
    UpstreamRejected,
    ProviderError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownToolError => "UnknownToolError",
            ErrorKind::InvalidArgumentError => "InvalidArgumentError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
            ErrorKind::EmbeddingError => "EmbeddingError",
            ErrorKind::IndexUnavailableError => "IndexUnavailableError",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ErrorKind::UpstreamRejected => "UpstreamRejected",
            ErrorKind::ProviderError => "ProviderError",
        }
    }

    /// Whether a caller may reasonably retry the same call.
    ///
    /// Client-input errors and cycles never succeed on retry; failures of an
    /// external collaborator might.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::UnknownToolError | ErrorKind::InvalidArgumentError | ErrorKind::RecursionError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure descriptor carried by a failed [`ToolResult`].
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending parameter for [`ErrorKind::InvalidArgumentError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ToolFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            parameter: None,
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorKind::UnknownToolError, format!("unknown tool `{}`", name))
    }

    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self {
            kind: ErrorKind::InvalidArgumentError,
            message: format!("invalid argument `{}`: {}", parameter, message.into()),
            parameter: Some(parameter),
        }
    }
}

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { result: Value },
    Failure { error: ToolFailure },
}

impl ToolResult {
    pub fn success(result: Value) -> Self {
        ToolResult::Success { result }
    }

    pub fn failure(error: ToolFailure) -> Self {
        ToolResult::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    /// The failure kind, if this result is a failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { error } => Some(error.kind),
        }
    }

    pub fn into_result(self) -> Result<Value, ToolFailure> {
        match self {
            ToolResult::Success { result } => Ok(result),
            ToolResult::Failure { error } => Err(error),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolResult::success(value),
            Err(err) => ToolResult::failure(err.into_failure()),
        }
    }
}

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid argument `{parameter}`: {message}")]
    InvalidArgument { parameter: String, message: String },

    /// The record source failed.
    #[error("record source: {0}")]
    Upstream(#[source] AdapterError),

    /// The generation provider failed.
    #[error("generation provider: {0}")]
    Provider(#[source] AdapterError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// A sub-invocation failed; its failure is passed up unchanged.
    #[error(transparent)]
    Failed(#[from] ToolFailure),
}

impl ToolError {
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArgument { .. } => ErrorKind::InvalidArgumentError,
            ToolError::Upstream(err) if err.is_unavailable() => ErrorKind::UpstreamUnavailable,
            ToolError::Upstream(_) => ErrorKind::UpstreamRejected,
            ToolError::Provider(_) => ErrorKind::ProviderError,
            ToolError::Retrieval(RetrievalError::IndexUnavailable(_)) => {
                ErrorKind::IndexUnavailableError
            }
            ToolError::Retrieval(_) => ErrorKind::EmbeddingError,
            ToolError::Failed(failure) => failure.kind,
        }
    }

    pub fn into_failure(self) -> ToolFailure {
        match self {
            ToolError::Failed(failure) => failure,
            ToolError::InvalidArgument { parameter, message } => {
                ToolFailure::invalid_argument(parameter, message)
            }
            other => ToolFailure::new(other.kind(), other.to_string()),
        }
    }
}

/// Executes one tool. Arguments arrive already validated against the
/// descriptor's schema.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError>;
}

/// A registered tool: stable name, argument schema and handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ArgSchema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ArgSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    pub(crate) fn handler(&self) -> &dyn ToolHandler {
        self.handler.as_ref()
    }

    /// Render as an MCP tool definition.
    pub fn to_mcp_tool(&self) -> rmcp::model::Tool {
        rmcp::model::Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(self.schema.to_json_schema()),
        )
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish()
    }
}

/// A single invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
