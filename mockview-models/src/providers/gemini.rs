//! Gemini model provider.
//!
//! Talks to the Generative Language REST API (`generateContent` and
//! `streamGenerateContent?alt=sse`).
//!
//! # Example
//!
//! ```ignore
//! use mockview_models::providers::GeminiProvider;
//!
//! let provider = GeminiProvider::new(api_key);
//! let provider = GeminiProvider::with_base_url(api_key, "http://127.0.0.1:8089");
//! ```

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ChatRequest, ChatResponse, ChatStream, Role, StreamChunk};
use crate::{Error, Result};

/// Default Generative Language API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ────────────────────────────────────────────────────────────────────────────
// Gemini API Types
// ────────────────────────────────────────────────────────────────────────────

/// A text part of a Gemini content block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// A content block (one conversation turn).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Generation options.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Request body for `generateContent` / `streamGenerateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

impl From<&ChatRequest> for GeminiRequest {
    fn from(request: &ChatRequest) -> Self {
        let system: Vec<GeminiPart> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| GeminiPart {
                text: m.content.clone(),
            })
            .collect();

        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some()
        {
            Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction: (!system.is_empty()).then(|| GeminiContent {
                role: None,
                parts: system,
            }),
            generation_config,
        }
    }
}

/// One candidate completion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response from `generateContent`, also the payload of each SSE event.
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Text of the first candidate, parts joined.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SSE framing
// ────────────────────────────────────────────────────────────────────────────

/// Remove every complete line from `buffer` and return the `data:` payloads.
///
/// A trailing partial line stays in the buffer for the next network chunk.
fn drain_sse_data(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() {
                payloads.push(data.to_string());
            }
        }
    }
    payloads
}

fn parse_stream_event(data: &str) -> Result<StreamChunk> {
    let response: GeminiResponse = serde_json::from_str(data)?;
    let text = response.text();
    Ok(StreamChunk {
        delta: (!text.is_empty()).then_some(text),
        done: false,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiProvider
// ────────────────────────────────────────────────────────────────────────────

/// Gemini cloud model provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider against the public API endpoint.
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider with a custom base URL.
    pub fn with_base_url(api_key: Option<SecretString>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn post(&self, url: &str, request: &ChatRequest) -> Result<reqwest::Response> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::CredentialsNotFound("gemini".to_string()))?;

        let body = GeminiRequest::from(request);
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    /// Perform a chat completion request.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(&request.model, "generateContent");
        let response = self.post(&url, &request).await?;

        let gemini: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        Ok(ChatResponse::text(gemini.text()))
    }

    /// Perform a streaming chat completion request.
    pub async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&request.model, "streamGenerateContent")
        );
        let response = self.post(&url, &request).await?;

        let stream = response
            .bytes_stream()
            .scan(Vec::new(), |buffer, result| {
                let items: Vec<Result<StreamChunk>> = match result {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        drain_sse_data(buffer)
                            .iter()
                            .map(|data| parse_stream_event(data))
                            .collect()
                    }
                    Err(e) => vec![Err(Error::Request(e.to_string()))],
                };
                std::future::ready(Some(items))
            })
            .flat_map(futures_util::stream::iter)
            // Drop keep-alive events with no text
            .filter(|result| {
                std::future::ready(match result {
                    Ok(chunk) => chunk.delta.is_some(),
                    Err(_) => true,
                })
            })
            .chain(futures_util::stream::once(std::future::ready(Ok(
                StreamChunk::finished(),
            ))));

        Ok(Box::pin(stream))
    }
}

#[async_trait::async_trait]
impl super::ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.chat(request).await
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        self.chat_stream(request).await
    }
}
