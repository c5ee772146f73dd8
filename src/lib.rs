//! # toolgate - schema-validated tool dispatch with retrieval
//!
//! A small gateway core that exposes a fixed set of named tools, validates
//! their arguments, lets one tool invoke another, and runs an embed-then-search
//! retrieval pipeline over a vector index.
//!
//! ## Architecture
//!
//! 1. **Adapters** wrap the external services (record source, embedding and
//!    generation provider, vector index) behind one-operation traits.
//! 2. The **Retrieval Pipeline** embeds a query and ranks index neighbors.
//! 3. The **Dispatcher** holds the frozen tool set, validates calls, runs
//!    handlers and threads one deadline through tool-to-tool chains.
//! 4. The **Gateway** decodes request envelopes; [`McpServer`] serves the same
//!    dispatcher over MCP.
//!
//! ## Built-in tools
//!
//! - `search(area, city)`: raw records from the record source.
//! - `summarize(area, city, abridged = true)`: `search` followed by generation.
//! - `vector_search(query, top_k = 5)`: ranked hits from the retrieval pipeline.
//!
//! ## Example
//! ```no_run
//! use toolgate::config::GatewayConfig;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let services = GatewayConfig {
//!         record_source_url: "https://schools.example.com/api".to_string(),
//!         provider_api_key: "your-api-key".to_string(),
//!         ..Default::default()
//!     }
//!     .build()?;
//!
//!     let reply = services
//!         .gateway
//!         .handle_mcp(json!({
//!             "tool": "summarize",
//!             "arguments": {"area": "downtown", "city": "Springfield"}
//!         }))
//!         .await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod http;
pub mod mcp;
pub mod options;
pub mod retrieval;
pub mod tools;

pub use adapters::{AdapterError, Embedder, Generator, RecordSource, VectorIndex};
pub use config::{ConfigError, GatewayConfig};
pub use dispatcher::{Dispatcher, RegistryError, ToolContext, ToolRegistry};
pub use gateway::{Gateway, GatewayError};
pub use mcp::McpServer;
pub use retrieval::{Hit, Query, RetrievalError, RetrievalPipeline};
pub use tools::{
    Arguments, ErrorKind, ToolCall, ToolDescriptor, ToolError, ToolFailure, ToolHandler,
    ToolResult,
};

// Re-export rmcp for convenience
pub use rmcp;
