//! Text generation provider abstraction.
//!
//! The orchestrator and classifier talk to a [`TextGenerator`] rather
//! than a concrete API client so exchanges can be driven by scripted
//! providers in tests. [`GeminiClient`] is the production
//! implementation.

pub mod classifier;
pub mod gemini;

pub use gemini::GeminiClient;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Inline image attached to a user turn (base64 payload + MIME type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub base64: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history as submitted by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, rename = "imageData", skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_data: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image_data: None,
        }
    }
}

/// Stream of text increments in provider arrival order.
pub type TextChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A provider that can stream a chat completion and answer one-shot
/// completion requests (used for expression classification).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Open a streaming completion over the conversation history.
    async fn stream_chat(&self, system: &str, turns: &[ChatTurn]) -> Result<TextChunkStream>;

    /// One-shot completion; returns the full response text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}
