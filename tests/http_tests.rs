// End-to-end tests over the HTTP surface: a real listener, scripted
// upstream collaborators, and a streaming client reading the event
// protocol off the wire.

use anyhow::Result;
use async_trait::async_trait;
use avatar_chat::config::SynthesisConfig;
use avatar_chat::expression::Expression;
use avatar_chat::http::{create_router, AppState};
use avatar_chat::llm::{ChatTurn, TextChunkStream, TextGenerator};
use avatar_chat::orchestrator::Orchestrator;
use avatar_chat::protocol::{Event, FrameReader};
use avatar_chat::synthesis::{
    AudioClip, RenderQueueSynthesizer, SpeechSynthesizer, SynthesisError,
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct ScriptedGenerator {
    chunks: Vec<String>,
    classifier_reply: String,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn stream_chat(&self, _system: &str, _turns: &[ChatTurn]) -> Result<TextChunkStream> {
        let items: Vec<Result<String>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.classifier_reply.clone())
    }
}

struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _expression: Expression,
        _cancel: &CancellationToken,
    ) -> Result<AudioClip, SynthesisError> {
        Err(SynthesisError::Rejected("scripted rejection".to_string()))
    }
}

struct TimedOutSynthesizer;

#[async_trait]
impl SpeechSynthesizer for TimedOutSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _expression: Expression,
        _cancel: &CancellationToken,
    ) -> Result<AudioClip, SynthesisError> {
        Err(SynthesisError::Timeout(Duration::from_secs(120)))
    }
}

async fn spawn_server(state: AppState) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, create_router(state)).await;
    });
    Ok(addr)
}

fn scripted_state(chunks: &[&str], synthesizer: Arc<dyn SpeechSynthesizer>) -> AppState {
    let generator = Arc::new(ScriptedGenerator {
        chunks: chunks.iter().map(|c| c.to_string()).collect(),
        classifier_reply: "happy".to_string(),
    });
    let orchestrator = Arc::new(Orchestrator::new(
        generator,
        synthesizer.clone(),
        "test persona".to_string(),
    ));
    AppState::new(orchestrator, synthesizer)
}

#[tokio::test]
async fn health_check_acknowledges() -> Result<()> {
    let state = scripted_state(&["hi"], Arc::new(FailingSynthesizer));
    let addr = spawn_server(state).await?;

    let response = reqwest::get(format!("http://{}/api/health", addr)).await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body, serde_json::json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn chat_streams_ordered_events_over_the_wire() -> Result<()> {
    let state = scripted_state(&["G'day", " mate"], Arc::new(FailingSynthesizer));
    let addr = spawn_server(state).await?;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/chat", addr))
        .json(&serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    let mut reader = FrameReader::new();
    let mut events = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        for frame in reader.push(&chunk?) {
            if let Some(event) = Event::from_frame(&frame) {
                events.push(event);
            }
        }
    }

    assert_eq!(
        events,
        vec![
            Event::Text("G'day".to_string()),
            Event::Text(" mate".to_string()),
            Event::Expression(Expression::Happy),
            Event::AudioStart,
            Event::AudioError,
            Event::Done,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn tts_maps_empty_input_to_bad_request() -> Result<()> {
    let synthesizer = Arc::new(RenderQueueSynthesizer::new(SynthesisConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        access_client_id: None,
        access_client_secret: None,
        poll_interval_secs: 1,
        poll_timeout_secs: 120,
    }));
    let state = scripted_state(&["hi"], synthesizer);
    let addr = spawn_server(state).await?;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/tts", addr))
        .json(&serde_json::json!({"text": ""}))
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    Ok(())
}

#[tokio::test]
async fn tts_maps_render_timeout_to_gateway_timeout() -> Result<()> {
    let state = scripted_state(&["hi"], Arc::new(TimedOutSynthesizer));
    let addr = spawn_server(state).await?;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/tts", addr))
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await?;

    assert_eq!(response.status(), 504);
    Ok(())
}

#[tokio::test]
async fn tts_maps_unreachable_queue_to_bad_gateway() -> Result<()> {
    let synthesizer = Arc::new(RenderQueueSynthesizer::new(SynthesisConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        access_client_id: None,
        access_client_secret: None,
        poll_interval_secs: 1,
        poll_timeout_secs: 120,
    }));
    let state = scripted_state(&["hi"], synthesizer);
    let addr = spawn_server(state).await?;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/tts", addr))
        .json(&serde_json::json!({"text": "hello"}))
        .send()
        .await?;

    assert_eq!(response.status(), 502);
    Ok(())
}
