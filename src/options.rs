//! Model and transport configuration shared by the service adapters.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;

/// Default per-call timeout enforced by every adapter.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Model behavior parameters sent to the generation provider.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Chat model used for summaries and raw chat.
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Cap on generated tokens; the provider default applies when unset.
    pub max_tokens: Option<u32>,
}

impl ModelOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// How an adapter reaches its service.
///
/// Every adapter owns one of these and builds its pooled HTTP client from it
/// exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOptions {
    /// HTTP transport configuration
    Http {
        /// Per-request timeout. Adapters never run without one.
        timeout: Duration,
        /// HTTP proxy URL.
        proxy: Option<String>,
        /// Additional HTTP headers to send with every request.
        headers: Option<HashMap<String, String>>,
    },
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions::Http {
            timeout: DEFAULT_ADAPTER_TIMEOUT,
            proxy: None,
            headers: None,
        }
    }
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on a single adapter call, connect phase included.
    pub fn timeout(&self) -> Duration {
        let TransportOptions::Http { timeout, .. } = self;
        *timeout
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        let TransportOptions::Http { timeout, .. } = &mut self;
        *timeout = duration;
        self
    }

    /// Route every adapter request through `proxy_url`.
    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        let TransportOptions::Http { proxy, .. } = &mut self;
        *proxy = Some(proxy_url.into());
        self
    }

    /// Send `key: value` with every request, e.g. an organization header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let TransportOptions::Http { headers, .. } = &mut self;
        headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}
