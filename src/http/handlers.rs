use super::state::AppState;
use crate::expression::Expression;
use crate::llm::ChatTurn;
use crate::protocol::Event;
use crate::synthesis::SynthesisError;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation history, oldest first; the last turn is the send
    /// being answered.
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
/// Run one exchange and stream its ordered events back as the response body.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    info!("Starting exchange over {} history turns", req.messages.len());

    let (tx, rx) = mpsc::channel::<Event>(32);
    let cancel = CancellationToken::new();

    // Client disconnect drops the receiver; propagate that as a
    // cancellation so in-flight polling stops promptly.
    let disconnect_tx = tx.clone();
    let disconnect_cancel = cancel.clone();
    tokio::spawn(async move {
        disconnect_tx.closed().await;
        disconnect_cancel.cancel();
    });

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run_exchange(req.messages, cancel, tx).await;
    });

    let body = Body::from_stream(
        ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.encode())),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// POST /api/tts
/// Synthesize a standalone clip for raw text, outside any exchange.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(req): Json<TtsRequest>,
) -> impl IntoResponse {
    let cancel = CancellationToken::new();

    match state
        .synthesizer
        .synthesize(&req.text, Expression::default(), &cancel)
        .await
    {
        Ok(clip) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, clip.content_type)],
            clip.bytes,
        )
            .into_response(),
        Err(SynthesisError::EmptyInput) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No speakable text provided".to_string(),
            }),
        )
            .into_response(),
        Err(e @ SynthesisError::Timeout(_)) => {
            error!("TTS request timed out: {}", e);
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("TTS request failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}
