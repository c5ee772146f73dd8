//! OpenAI-compatible embedding and chat completion client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::adapters::{AdapterError, Embedder, Generator};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::options::{ModelOptions, TransportOptions};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Client for `/v1/embeddings` and `/v1/chat/completions`.
///
/// One instance serves both the [`Embedder`] and the [`Generator`] role; the
/// two operations only differ in the model they address.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_options: ModelOptions,
    transport_options: TransportOptions,
    http: Client,
}

impl OpenAiProvider {
    /// Create a provider against the public OpenAI endpoint with default models.
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(
            api_key,
            DEFAULT_BASE_URL,
            DEFAULT_EMBEDDING_MODEL,
            ModelOptions::new(DEFAULT_CHAT_MODEL),
            TransportOptions::default(),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        embedding_model: impl Into<String>,
        chat_options: ModelOptions,
        transport_options: TransportOptions,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            embedding_model: embedding_model.into(),
            chat_options,
            http: build_http_client(&transport_options)?,
            transport_options,
        })
    }

    pub fn chat_options(&self) -> &ModelOptions {
        &self.chat_options
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, AdapterError> {
        let url = format!("{}{}", self.base_url, path);

        let req = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json");
        let req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            return Err(handle_error_response(status, body));
        }

        Ok(response)
    }
}

/// Prefer the provider's own error message over the raw body.
fn handle_error_response(status: reqwest::StatusCode, body: String) -> AdapterError {
    let body = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(error_resp) => format!(
            "API error ({}): {}",
            error_resp.error.error_type.unwrap_or_default(),
            error_resp.error.message
        ),
        Err(_) => body,
    };

    AdapterError::Rejected {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AdapterError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response: EmbeddingResponse = self
            .post("/v1/embeddings", &request)
            .await?
            .json_logged()
            .await?;

        response.into_vector()
    }
}

#[async_trait]
impl Generator for OpenAiProvider {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        user_content: &str,
    ) -> Result<String, AdapterError> {
        let request = ChatRequest::new(&self.chat_options, system_instruction, user_content);

        let response: ChatResponse = self
            .post("/v1/chat/completions", &request)
            .await?
            .json_logged()
            .await?;

        response.into_text()
    }
}

// --- Embeddings API Types ---

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_vector(self) -> Result<Vec<f32>, AdapterError> {
        self.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AdapterError::Malformed("embedding response has no data".into()))
    }
}

// --- Chat Completions API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
}

impl<'a> ChatRequest<'a> {
    fn new(options: &'a ModelOptions, system: Option<&'a str>, user: &'a str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(content) = system {
            messages.push(ChatMessage {
                role: "system",
                content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, AdapterError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdapterError::Malformed("chat response has no content".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}
