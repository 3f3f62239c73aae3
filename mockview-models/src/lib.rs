//! Generative model providers for mockview.
//!
//! This crate provides:
//! - Provider trait for a unified chat/streaming interface
//! - A Gemini provider speaking the Generative Language REST API
//! - A scripted provider for deterministic tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 dyn ModelProvider                   │
//! │  ┌──────────────────────┐  ┌─────────────────────┐  │
//! │  │    GeminiProvider    │  │  ScriptedProvider   │  │
//! │  │  (generateContent /  │  │  (queued replies,   │  │
//! │  │   SSE streaming)     │  │   tests only)       │  │
//! │  └──────────────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;

pub mod providers;

pub use error::{Error, Result};
pub use providers::{
    ChatRequest, ChatResponse, ChatStream, GeminiProvider, Message, ModelProvider, Role,
    ScriptedProvider, ScriptedReply, StreamChunk,
};
