//! ComfyUI-style render queue implementation of [`SpeechSynthesizer`].
//!
//! Job lifecycle: `POST /api/prompt` queues a workflow, `GET
//! /api/history/{id}` is polled until the output node reports an audio
//! artifact, `GET /api/view` fetches the binary.

use super::{poll_until, AudioClip, SpeechSynthesizer, SynthesisError, SynthesisJob};
use crate::config::SynthesisConfig;
use crate::expression::Expression;
use crate::sanitize::sanitize_for_speech;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Workflow node whose text and speed inputs are overwritten per job.
const TEXT_NODE: &str = "44";
/// Workflow node that saves the rendered audio artifact.
const OUTPUT_NODE: &str = "16";

const DEFAULT_CONTENT_TYPE: &str = "audio/flac";

pub struct RenderQueueSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl RenderQueueSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn with_credentials(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(id) = &self.config.access_client_id {
            request = request.header("CF-Access-Client-Id", id);
        }
        if let Some(secret) = &self.config.access_client_secret {
            request = request.header("CF-Access-Client-Secret", secret);
        }
        request
    }

    /// Fixed workflow template; the per-job text and speed inputs are
    /// overwritten before submission.
    fn workflow_template() -> serde_json::Value {
        let mut workflow = serde_json::Map::new();
        workflow.insert(
            TEXT_NODE.to_string(),
            json!({
                "class_type": "ChatterboxTTS",
                "inputs": {
                    "text": "",
                    "voice_speed_factor": 1.0,
                    "seed": 42,
                }
            }),
        );
        workflow.insert(
            OUTPUT_NODE.to_string(),
            json!({
                "class_type": "SaveAudio",
                "inputs": {
                    "audio": [TEXT_NODE, 0],
                    "filename_prefix": "tts/clip",
                }
            }),
        );
        serde_json::Value::Object(workflow)
    }

    /// Queue the job; a non-success status or malformed body is a hard
    /// rejection.
    async fn submit(&self, text: &str, speed_factor: f64) -> Result<String, SynthesisError> {
        let mut workflow = Self::workflow_template();
        workflow[TEXT_NODE]["inputs"]["text"] = json!(text);
        workflow[TEXT_NODE]["inputs"]["voice_speed_factor"] = json!(speed_factor);

        let response = self
            .with_credentials(self.client.post(self.url("/api/prompt")))
            .json(&json!({ "prompt": workflow }))
            .send()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SynthesisError::Rejected(format!(
                "queue returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        let queued: QueueResponse = serde_json::from_str(&body).map_err(|_| {
            SynthesisError::Rejected(format!(
                "queue returned non-JSON body: {}",
                &body[..body.len().min(300)]
            ))
        })?;

        Ok(queued.prompt_id)
    }

    /// One poll attempt. Transport errors, non-success statuses, and
    /// unparsable bodies all mean "not ready yet".
    async fn poll_job(&self, job_id: &str) -> Option<AudioArtifact> {
        let url = self.url(&format!("/api/history/{}", job_id));
        let response = self
            .with_credentials(self.client.get(url))
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let history: HashMap<String, HistoryEntry> = response.json().await.ok()?;
        history
            .get(job_id)?
            .outputs
            .get(OUTPUT_NODE)?
            .audio
            .first()
            .cloned()
    }

    async fn fetch(&self, artifact: &AudioArtifact) -> Result<AudioClip, SynthesisError> {
        let response = self
            .with_credentials(self.client.get(self.url("/api/view")))
            .query(&[
                ("filename", artifact.filename.as_str()),
                ("type", artifact.kind.as_str()),
                ("subfolder", artifact.subfolder.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SynthesisError::Upstream(format!(
                "artifact fetch returned status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Upstream(e.to_string()))?;

        Ok(AudioClip {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for RenderQueueSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        expression: Expression,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, SynthesisError> {
        let sanitized_text = sanitize_for_speech(text);
        if sanitized_text.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }

        let speed_factor = expression.speed_factor();
        let id = self.submit(&sanitized_text, speed_factor).await?;
        let job = SynthesisJob {
            id,
            sanitized_text,
            speed_factor,
        };

        info!(
            "Queued synthesis job {} ({} chars, speed {:.2})",
            job.id,
            job.sanitized_text.len(),
            job.speed_factor
        );

        let artifact = poll_until(
            self.config.poll_interval(),
            self.config.poll_timeout(),
            cancel,
            || self.poll_job(&job.id),
        )
        .await;

        let artifact = match artifact {
            Some(artifact) => artifact,
            None if cancel.is_cancelled() => return Err(SynthesisError::Cancelled),
            None => {
                warn!("Synthesis job {} timed out", job.id);
                return Err(SynthesisError::Timeout(self.config.poll_timeout()));
            }
        };

        self.fetch(&artifact).await
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    outputs: HashMap<String, NodeOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeOutput {
    #[serde(default)]
    audio: Vec<AudioArtifact>,
}

/// Output artifact descriptor as reported by the render queue.
#[derive(Debug, Clone, Deserialize)]
struct AudioArtifact {
    filename: String,
    #[serde(default)]
    subfolder: String,
    #[serde(rename = "type")]
    kind: String,
}
