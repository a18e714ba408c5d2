//! Drives one exchange's event stream into the message store.

use super::messages::{ExchangeHandle, MessageStore};
use crate::llm::ImageData;
use crate::protocol::{Event, FrameReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How often the loading caption rotates while audio is generating.
pub const CAPTION_ROTATE_INTERVAL: Duration = Duration::from_secs(3);

/// Owns the timer that rotates loading captions.
///
/// Aborting the task is tied to this handle's lifetime, so dropping
/// the rotator (on `audio`, `audio_error`, `done`, or abort) is
/// guaranteed to stop rotation.
pub struct CaptionRotator {
    handle: JoinHandle<()>,
}

impl CaptionRotator {
    fn start(store: Arc<Mutex<MessageStore>>, assistant_id: Uuid, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; the initial caption
            // was already set by the audio_start event.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.lock().await.rotate_caption(assistant_id);
            }
        });
        Self { handle }
    }
}

impl Drop for CaptionRotator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Incrementally parses one exchange's response bytes and applies the
/// resulting events to the shared [`MessageStore`].
pub struct ExchangeReader {
    store: Arc<Mutex<MessageStore>>,
    exchange: ExchangeHandle,
    frames: FrameReader,
    rotator: Option<CaptionRotator>,
    caption_interval: Duration,
}

impl ExchangeReader {
    /// Create the paired user/assistant messages and a reader for the
    /// exchange that will answer them.
    pub async fn begin(
        store: Arc<Mutex<MessageStore>>,
        content: String,
        image_data: Option<ImageData>,
    ) -> Self {
        let exchange = store.lock().await.begin_exchange(content, image_data);
        Self {
            store,
            exchange,
            frames: FrameReader::new(),
            rotator: None,
            caption_interval: CAPTION_ROTATE_INTERVAL,
        }
    }

    pub fn with_caption_interval(mut self, interval: Duration) -> Self {
        self.caption_interval = interval;
        self
    }

    pub fn assistant_id(&self) -> Uuid {
        self.exchange.assistant_id
    }

    pub fn user_id(&self) -> Uuid {
        self.exchange.user_id
    }

    /// Whether the terminal event has been observed (or the exchange
    /// was aborted).
    pub fn is_finished(&self) -> bool {
        self.exchange.is_finished()
    }

    /// Feed one network chunk; applies every event it completes.
    ///
    /// Chunks may split frames anywhere, including mid-code-point.
    pub async fn feed(&mut self, chunk: &[u8]) {
        for frame in self.frames.push(chunk) {
            let Some(event) = Event::from_frame(&frame) else {
                continue;
            };
            self.apply(event).await;
        }
    }

    async fn apply(&mut self, event: Event) {
        match event {
            Event::AudioStart => {
                self.rotator = Some(CaptionRotator::start(
                    self.store.clone(),
                    self.exchange.assistant_id,
                    self.caption_interval,
                ));
            }
            Event::Audio(_) | Event::AudioError | Event::Done => {
                // Audio left the generating state; the caption timer
                // must not outlive it.
                self.rotator = None;
            }
            _ => {}
        }

        self.store
            .lock()
            .await
            .apply_event(&mut self.exchange, &event);
    }

    /// The transport failed mid-exchange.
    pub async fn finish_with_error(&mut self) {
        self.rotator = None;
        self.store.lock().await.finish_with_error(&mut self.exchange);
    }

    /// The user aborted the exchange.
    pub async fn abort(&mut self) {
        self.rotator = None;
        self.store.lock().await.abort(&mut self.exchange);
    }
}
