//! Client for the native Ollama HTTP API.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::llm_client::LLMClient;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Model listing is cheap; it doubles as the availability probe.
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OllamaError {
    #[error("failed to connect to Ollama at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Ollama returned status {status} for {url}: {message}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        /// The reason Ollama gave, taken from its `error` field or the raw body.
        message: String,
    },
    #[error("invalid response from Ollama: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// A client bound to one Ollama endpoint and one model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT)
    }
}

impl OllamaClient {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        }
    }

    /// The same endpoint with a different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single prompt completion via `/api/generate`.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, OllamaError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };
        let response: GenerateResponse = self.post("/api/generate", &body).await?;
        Ok(response.response)
    }

    /// Multi-message completion via `/api/chat`.
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, OllamaError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        let response: ChatResponse = self.post("/api/chat", &body).await?;
        Ok(response.message.map(|m| m.content).unwrap_or_default())
    }

    /// Names of the models installed on the endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let url = self.url("/api/tags");
        let response = self
            .http
            .get(&url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|source| OllamaError::Connection {
                url: url.clone(),
                source,
            })?;
        let tags: TagsResponse = decode(url, response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// True when the endpoint answers a model listing.
    pub async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Ollama is not available");
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, OllamaError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "Sending Ollama request");
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| OllamaError::Connection {
                url: url.clone(),
                source,
            })?;
        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T, OllamaError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(OllamaError::HttpStatus {
            url,
            status,
            message,
        });
    }
    let text = response
        .text()
        .await
        .map_err(|source| OllamaError::Connection {
            url: url.clone(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|e| OllamaError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let messages = [
            ChatMessage::new(ChatRole::System, system_prompt),
            ChatMessage::new(ChatRole::User, prompt),
        ];
        Ok(self.chat(&messages).await?.trim().to_string())
    }
}
