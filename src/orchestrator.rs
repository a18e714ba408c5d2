//! Conversation orchestrator: one run per user send.
//!
//! Phase 1 relays provider text increments as they arrive. Phase 2
//! (classification, then synthesis) runs only after the provider
//! stream has fully drained and only for a non-empty response. Phase 3
//! emits the terminal `done` marker unconditionally.
//!
//! Cancellation is cooperative: a dropped receiver (client abort)
//! stops text relay immediately and skips phase 2 entirely, since side
//! effects for a discarded response are wasted work.

use crate::llm::{classifier, ChatTurn, TextGenerator};
use crate::protocol::Event;
use crate::synthesis::SpeechSynthesizer;
use base64::Engine;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        system_prompt: String,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            system_prompt,
        }
    }

    /// Drive one exchange, emitting ordered events into `tx`.
    ///
    /// Always ends by emitting [`Event::Done`] while the receiver is
    /// still attached; after an abort no further events are sent.
    pub async fn run_exchange(
        &self,
        turns: Vec<ChatTurn>,
        cancel: CancellationToken,
        tx: mpsc::Sender<Event>,
    ) {
        let full_text = self.relay_text(&turns, &cancel, &tx).await;

        if let Some(text) = full_text {
            if !text.trim().is_empty() && !cancel.is_cancelled() && !tx.is_closed() {
                self.side_effects(&text, &cancel, &tx).await;
            }
        }

        let _ = tx.send(Event::Done).await;
    }

    /// Phase 1: forward provider increments in arrival order.
    ///
    /// Returns the accumulated response, or `None` when the provider
    /// failed or the exchange was aborted; either way phase 2 is
    /// skipped.
    async fn relay_text(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Event>,
    ) -> Option<String> {
        let mut stream = match self.generator.stream_chat(&self.system_prompt, turns).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Text generation request failed: {:#}", e);
                return None;
            }
        };

        let mut full_text = String::new();

        while let Some(item) = stream.next().await {
            if cancel.is_cancelled() {
                info!("Exchange aborted during text relay");
                return None;
            }

            match item {
                Ok(chunk) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    full_text.push_str(&chunk);
                    if tx.send(Event::Text(chunk)).await.is_err() {
                        // Receiver gone: the client discarded this exchange.
                        return None;
                    }
                }
                Err(e) => {
                    error!("Text generation stream failed: {:#}", e);
                    return None;
                }
            }
        }

        Some(full_text)
    }

    /// Phase 2: classification, then synthesis. Neither may propagate
    /// an error to the transport.
    async fn side_effects(
        &self,
        full_text: &str,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Event>,
    ) {
        let expression = classifier::classify_expression(self.generator.as_ref(), full_text).await;
        if tx.send(Event::Expression(expression)).await.is_err() {
            return;
        }

        // Emitted before the attempt so the client can show its
        // loading state while the render queue works.
        if tx.send(Event::AudioStart).await.is_err() {
            return;
        }

        match self.synthesizer.synthesize(full_text, expression, cancel).await {
            Ok(clip) => {
                let payload = base64::engine::general_purpose::STANDARD.encode(&clip.bytes);
                let _ = tx.send(Event::Audio(payload)).await;
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                let _ = tx.send(Event::AudioError).await;
            }
        }
    }
}
