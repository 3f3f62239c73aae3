//! Scripted provider for deterministic tests.
//!
//! Queue replies with [`ScriptedProvider::push`] before exercising code that
//! calls the provider. Each `chat` or `chat_stream` call consumes one reply.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ChatStream, ModelProvider, StreamChunk};
use crate::{Error, Result};

/// A canned provider reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// Whole response text (streamed as a single chunk).
    Text(String),
    /// Response streamed chunk by chunk (joined for `chat`).
    Chunks(Vec<String>),
    /// Fail the call with a provider error.
    Fail(String),
    /// Never answer. Used to exercise timeouts.
    Hang,
}

/// Provider that replays queued replies and records what it was asked.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next call.
    pub fn push(&self, reply: ScriptedReply) {
        self.lock_replies().push_back(reply);
    }

    /// Queue a whole-text reply.
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(ScriptedReply::Text(text.into()));
    }

    /// Queue a streamed reply.
    pub fn push_chunks<I, S>(&self, chunks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ScriptedReply::Chunks(
            chunks.into_iter().map(Into::into).collect(),
        ));
    }

    /// Number of replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, request: ChatRequest) -> Result<ScriptedReply> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        self.lock_replies()
            .pop_front()
            .ok_or_else(|| Error::ScriptExhausted("scripted".to_string()))
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        match self.next_reply(request)? {
            ScriptedReply::Text(text) => Ok(ChatResponse::text(text)),
            ScriptedReply::Chunks(chunks) => Ok(ChatResponse::text(chunks.concat())),
            ScriptedReply::Fail(message) => Err(Error::ProviderApi(message)),
            ScriptedReply::Hang => std::future::pending().await,
        }
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        let chunks = match self.next_reply(request)? {
            ScriptedReply::Text(text) => vec![text],
            ScriptedReply::Chunks(chunks) => chunks,
            ScriptedReply::Fail(message) => return Err(Error::ProviderApi(message)),
            ScriptedReply::Hang => {
                return Ok(Box::pin(
                    futures_util::stream::pending::<Result<StreamChunk>>(),
                ));
            }
        };

        let mut items: Vec<Result<StreamChunk>> =
            chunks.into_iter().map(|c| Ok(StreamChunk::delta(c))).collect();
        items.push(Ok(StreamChunk::finished()));
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}
