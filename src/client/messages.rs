use crate::expression::Expression;
use crate::llm::{ImageData, Role};
use crate::protocol::Event;
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Substituted into the assistant message when the transport fails
/// mid-exchange. Never applied to aborted exchanges.
pub const APOLOGY_TEXT: &str = "Sorry, something went wrong. Try again?";

/// Captions shown while a clip is being rendered; rotated on a timer.
pub const LOADING_CAPTIONS: [&str; 6] = [
    "Warming up the voice...",
    "Clearing the throat...",
    "Finding the right tone...",
    "Stepping into the booth...",
    "Rolling tape...",
    "Almost there...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Generating,
    Ready,
    Error,
}

/// One chat message as held by the front end.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    /// Append-only while its exchange streams; immutable afterwards,
    /// apart from the single apology substitution on hard failure.
    pub content: String,
    pub image_data: Option<ImageData>,
    pub audio_status: Option<AudioStatus>,
    /// Decoded audio payload; dropped with the message.
    pub audio: Option<Vec<u8>>,
    pub loading_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String, image_data: Option<ImageData>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            image_data,
            audio_status: None,
            audio: None,
            loading_message: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Streaming,
    Done,
    Aborted,
}

/// Handle for the one in-flight exchange created by a user send.
#[derive(Debug)]
pub struct ExchangeHandle {
    pub user_id: Uuid,
    pub assistant_id: Uuid,
    phase: Phase,
}

impl ExchangeHandle {
    pub fn is_finished(&self) -> bool {
        self.phase != Phase::Streaming
    }

    pub fn was_aborted(&self) -> bool {
        self.phase == Phase::Aborted
    }
}

/// Per-message lifecycle state plus the shared current-expression slot.
///
/// Callers are expected to keep at most one exchange in flight; the
/// store itself does not enforce it.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    current_expression: Expression,
    caption_cursor: usize,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Expression currently shown on the avatar, independent of any
    /// message lifecycle.
    pub fn current_expression(&self) -> Expression {
        self.current_expression
    }

    /// Append the user message and its paired empty assistant message.
    pub fn begin_exchange(
        &mut self,
        content: String,
        image_data: Option<ImageData>,
    ) -> ExchangeHandle {
        let user = Message::new(Role::User, content, image_data);
        let assistant = Message::new(Role::Assistant, String::new(), None);
        let handle = ExchangeHandle {
            user_id: user.id,
            assistant_id: assistant.id,
            phase: Phase::Streaming,
        };
        self.messages.push(user);
        self.messages.push(assistant);
        handle
    }

    /// Apply one typed event to the exchange's assistant message.
    ///
    /// Events arriving after the exchange finished or was aborted are
    /// ignored wholesale.
    pub fn apply_event(&mut self, exchange: &mut ExchangeHandle, event: &Event) {
        if exchange.is_finished() {
            return;
        }

        match event {
            Event::Text(text) => {
                if let Some(message) = self.message_mut(exchange.assistant_id) {
                    message.content.push_str(text);
                }
            }
            Event::Expression(expression) => {
                self.current_expression = *expression;
            }
            Event::AudioStart => {
                let caption = LOADING_CAPTIONS[self.caption_cursor % LOADING_CAPTIONS.len()];
                if let Some(message) = self.message_mut(exchange.assistant_id) {
                    message.audio_status = Some(AudioStatus::Generating);
                    message.loading_message = Some(caption.to_string());
                }
            }
            Event::Audio(payload) => {
                match base64::engine::general_purpose::STANDARD.decode(payload) {
                    Ok(bytes) => {
                        if let Some(message) = self.message_mut(exchange.assistant_id) {
                            message.audio = Some(bytes);
                            message.audio_status = Some(AudioStatus::Ready);
                            message.loading_message = None;
                        }
                    }
                    Err(e) => {
                        warn!("Discarding undecodable audio payload: {}", e);
                        self.clear_audio_state(exchange.assistant_id);
                    }
                }
            }
            Event::AudioError => {
                // Silent degradation: the message stays text-only.
                self.clear_audio_state(exchange.assistant_id);
            }
            Event::Done => {
                exchange.phase = Phase::Done;
            }
        }
    }

    /// Advance the loading caption; a no-op unless audio is still
    /// being generated.
    pub fn rotate_caption(&mut self, assistant_id: Uuid) {
        let next = {
            self.caption_cursor += 1;
            LOADING_CAPTIONS[self.caption_cursor % LOADING_CAPTIONS.len()]
        };
        if let Some(message) = self.message_mut(assistant_id) {
            if message.audio_status == Some(AudioStatus::Generating) {
                message.loading_message = Some(next.to_string());
            }
        }
    }

    /// Transport failure: substitute the apology text, unless the
    /// exchange already completed or was aborted by the user.
    pub fn finish_with_error(&mut self, exchange: &mut ExchangeHandle) {
        if exchange.is_finished() {
            return;
        }
        exchange.phase = Phase::Done;
        if let Some(message) = self.message_mut(exchange.assistant_id) {
            message.content = APOLOGY_TEXT.to_string();
            message.audio_status = None;
            message.loading_message = None;
        }
    }

    /// User-initiated abort: freeze the exchange as-is. No apology,
    /// no further event application.
    pub fn abort(&mut self, exchange: &mut ExchangeHandle) {
        if exchange.is_finished() {
            return;
        }
        exchange.phase = Phase::Aborted;
        self.clear_audio_state(exchange.assistant_id);
    }

    /// Remove a message, releasing its decoded audio with it.
    pub fn remove_message(&mut self, id: Uuid) {
        self.messages.retain(|m| m.id != id);
    }

    fn message_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    fn clear_audio_state(&mut self, id: Uuid) {
        if let Some(message) = self.message_mut(id) {
            message.audio_status = None;
            message.loading_message = None;
        }
    }
}
