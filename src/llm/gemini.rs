//! Gemini REST client implementing [`TextGenerator`].
//!
//! Streaming uses `:streamGenerateContent?alt=sse`, which delivers the
//! same frame shape as our public protocol (`data:` lines separated by
//! blank lines), so the shared [`FrameReader`] reassembles it before
//! the JSON payloads are decoded.

use super::{ChatTurn, Role, TextChunkStream, TextGenerator};
use crate::config::LlmConfig;
use crate::protocol::FrameReader;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.api_base, self.model, method, self.api_key
        )
    }

    fn build_request(system: &str, turns: &[ChatTurn]) -> GenerateRequest {
        let contents = turns
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };

                let mut parts = vec![Part {
                    text: Some(turn.content.clone()),
                    inline_data: None,
                }];
                if let Some(image) = &turn.image_data {
                    parts.push(Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.base64.clone(),
                        }),
                    });
                }

                Content {
                    role: role.to_string(),
                    parts,
                }
            })
            .collect();

        GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: Some(system.to_string()),
                    inline_data: None,
                }],
            },
            contents,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn stream_chat(&self, system: &str, turns: &[ChatTurn]) -> Result<TextChunkStream> {
        let body = Self::build_request(system, turns);

        let response = self
            .client
            .post(self.url("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .json(&body)
            .send()
            .await
            .context("Failed to reach text generation provider")?;

        if !response.status().is_success() {
            bail!("Text generation request failed: {}", response.status());
        }

        let mut reader = FrameReader::new();
        let stream = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => {
                    let pieces: Vec<Result<String>> = reader
                        .push(&bytes)
                        .iter()
                        .filter_map(|frame| chunk_text(&frame.data))
                        .map(Ok)
                        .collect();
                    pieces
                }
                Err(e) => vec![Err(anyhow::Error::new(e).context("Text generation stream failed"))],
            })
            .map(futures::stream::iter)
            .flatten();

        Ok(Box::pin(stream))
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = Self::build_request(system, &[ChatTurn::user(prompt)]);

        let response = self
            .client
            .post(self.url("generateContent"))
            .json(&body)
            .send()
            .await
            .context("Failed to reach text generation provider")?;

        if !response.status().is_success() {
            bail!("Completion request failed: {}", response.status());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Malformed completion response")?;

        parsed
            .text()
            .context("Completion response carried no text")
    }
}

/// Extract the text delta from one streamed response payload.
fn chunk_text(data: &str) -> Option<String> {
    let parsed: GenerateResponse = serde_json::from_str(data).ok()?;
    let text = parsed.text()?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let parts = candidate.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
