//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait defines the unified interface the interviewer
//! talks to, whether backed by the Gemini REST API or a scripted test double.
//!
//! # Example
//!
//! ```ignore
//! use mockview_models::providers::{ChatRequest, Message, ModelProvider};
//!
//! async fn ask(provider: &dyn ModelProvider) {
//!     let request = ChatRequest::new("gemini-2.0-flash", vec![Message::user("Hello!")]);
//!     let response = provider.chat(request).await?;
//!     println!("Response: {}", response.content);
//! }
//! ```

mod gemini;
mod scripted;
mod types;

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

pub use gemini::{DEFAULT_BASE_URL, GeminiProvider};
pub use scripted::{ScriptedProvider, ScriptedReply};
pub use types::*;

use crate::Result;

/// A stream of chat response chunks for streaming responses.
///
/// This is a pinned, boxed stream that yields [`StreamChunk`] items or errors.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Trait for model providers.
///
/// # Required Methods
///
/// - [`name`](ModelProvider::name) - Provider identifier (e.g., "gemini")
/// - [`chat`](ModelProvider::chat) - Non-streaming chat completion
/// - [`chat_stream`](ModelProvider::chat_stream) - Streaming chat completion
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name.
    fn name(&self) -> &str;

    /// Perform a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Perform a streaming chat completion request.
    ///
    /// The stream ends after a chunk with `done == true` or when the
    /// underlying transport closes.
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream>;
}
