//! Speech synthesis gateway.
//!
//! Synthesis runs against a job-queue render service: submit a job,
//! poll bounded-duration for its output artifact, fetch the binary.
//! Every failure mode surfaces as a [`SynthesisError`] variant so the
//! orchestrator has a single uniform `audio_error` path and the direct
//! TTS endpoint can map classes to HTTP statuses.

pub mod render_queue;

pub use render_queue::RenderQueueSynthesizer;

use crate::expression::Expression;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A finished speech clip: raw bytes plus declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// One synthesis unit of work, owned by the gateway for the duration
/// of a single poll cycle.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub id: String,
    pub sanitized_text: String,
    pub speed_factor: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("nothing to synthesize after sanitization")]
    EmptyInput,

    #[error("render queue rejected the job: {0}")]
    Rejected(String),

    #[error("render queue produced no output within {0:?}")]
    Timeout(Duration),

    #[error("render queue request failed: {0}")]
    Upstream(String),

    #[error("synthesis cancelled")]
    Cancelled,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for `text`, pacing the voice by `expression`.
    ///
    /// Never panics and never leaks transport errors: every failure is
    /// a [`SynthesisError`]. Checks `cancel` between poll attempts.
    async fn synthesize(
        &self,
        text: &str,
        expression: Expression,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, SynthesisError>;
}

/// Bounded cooperative poll loop.
///
/// Sleeps `interval`, then runs `attempt`, until either an attempt
/// yields a value or `deadline` of wall clock has elapsed. `cancel` is
/// checked before each sleep. With interval 1s and deadline 120s this
/// makes at most 120 attempts.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    deadline: Duration,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = tokio::time::Instant::now();

    while start.elapsed() < deadline {
        if cancel.is_cancelled() {
            return None;
        }
        tokio::time::sleep(interval).await;

        if let Some(value) = attempt().await {
            return Some(value);
        }
    }

    None
}
