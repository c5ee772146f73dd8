//! Tool registry and dispatcher.
//!
//! Tools are registered into a [`ToolRegistry`] at startup. The registry is then
//! moved into a [`Dispatcher`], which never hands out mutable access again, so
//! concurrent invocations need no locking.
//!
//! Each top-level [`Dispatcher::invoke`] gets one deadline. Handlers call other
//! tools through their [`ToolContext`], which threads that same deadline and
//! the chain of tool names through every sub-invocation. A tool that appears
//! twice in its own chain is rejected as a cycle.

use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::tools::{Arguments, ErrorKind, ToolCall, ToolDescriptor, ToolFailure, ToolResult};

/// Deadline applied to a top-level invocation when none is configured.
pub const DEFAULT_INVOCATION_DEADLINE: Duration = Duration::from_secs(30);

/// Errors raised while building the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
}

/// Mutable set of tools, used only during startup.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }

        debug!("Registered tool {}", name);
        self.tools.insert(name, descriptor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Read-only dispatcher over a frozen set of tools.
#[derive(Debug)]
pub struct Dispatcher {
    tools: HashMap<String, ToolDescriptor>,
    deadline: Duration,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            tools: registry.tools,
            deadline: DEFAULT_INVOCATION_DEADLINE,
        }
    }

    /// Set the overall deadline for each top-level invocation.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Registered tools, ordered by name.
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        let mut tools: Vec<&ToolDescriptor> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Invoke `name` with `args` under the configured deadline.
    pub async fn invoke(&self, name: &str, args: Arguments) -> ToolResult {
        self.invoke_until(name, args, Instant::now() + self.deadline)
            .await
    }

    /// Invoke `name` with `args`; the whole chain must finish by `deadline`.
    pub async fn invoke_until(&self, name: &str, args: Arguments, deadline: Instant) -> ToolResult {
        let ctx = ToolContext {
            dispatcher: self,
            deadline,
            chain: Vec::new(),
            invocation_id: Uuid::new_v4(),
        };
        ctx.dispatch(name, args).await
    }
}

/// Execution context handed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolContext<'a> {
    dispatcher: &'a Dispatcher,
    deadline: Instant,
    chain: Vec<String>,
    invocation_id: Uuid,
}

impl<'a> ToolContext<'a> {
    /// Deadline shared by the whole invocation chain.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Tool names from the top-level call down to the current one.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Invoke another tool as part of the current one.
    pub async fn invoke(&self, name: &str, args: Arguments) -> ToolResult {
        self.dispatch(name, args).await
    }

    /// Invoke several tools concurrently and wait for all of them.
    ///
    /// Results come back in the order of `calls`.
    pub async fn invoke_all(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        join_all(
            calls
                .into_iter()
                .map(|call| async move { self.dispatch(&call.name, call.arguments).await }),
        )
        .await
    }

    async fn dispatch(&self, name: &str, args: Arguments) -> ToolResult {
        let Some(descriptor) = self.dispatcher.tools.get(name) else {
            warn!(invocation = %self.invocation_id, "Unknown tool requested: {}", name);
            return ToolResult::failure(ToolFailure::unknown_tool(name));
        };

        if self.chain.iter().any(|n| n == name) {
            let cycle = format!("{} -> {}", self.chain.join(" -> "), name);
            warn!(invocation = %self.invocation_id, "Tool cycle rejected: {}", cycle);
            return ToolResult::failure(ToolFailure::new(
                ErrorKind::RecursionError,
                format!("tool cycle detected: {}", cycle),
            ));
        }

        let args = match descriptor.schema().validate(&args) {
            Ok(args) => args,
            Err(err) => {
                warn!(invocation = %self.invocation_id, "Tool {} rejected arguments: {}", name, err);
                return ToolResult::failure(err.into_failure());
            }
        };

        if Instant::now() >= self.deadline {
            return deadline_exceeded(name);
        }

        let mut chain = self.chain.clone();
        chain.push(name.to_string());
        let child = ToolContext {
            dispatcher: self.dispatcher,
            deadline: self.deadline,
            chain,
            invocation_id: self.invocation_id,
        };

        let span = tracing::info_span!(
            "tool",
            tool = name,
            invocation = %self.invocation_id,
            depth = child.chain.len()
        );
        span.in_scope(|| {
            info!("Tool call requested: {}", name);
            debug!("Tool arguments: {:?}", args);
        });

        let outcome = tokio::time::timeout_at(
            self.deadline,
            descriptor.handler().call(&child, args).instrument(span.clone()),
        )
        .await;

        let result = match outcome {
            Ok(result) => ToolResult::from(result),
            Err(_) => deadline_exceeded(name),
        };

        span.in_scope(|| match &result {
            ToolResult::Success { .. } => info!("Tool {} executed successfully", name),
            ToolResult::Failure { error } => warn!("Tool {} execution failed: {}", name, error),
        });

        result
    }
}

fn deadline_exceeded(name: &str) -> ToolResult {
    ToolResult::failure(ToolFailure::new(
        ErrorKind::DeadlineExceeded,
        format!("tool `{}` did not finish before the invocation deadline", name),
    ))
}
