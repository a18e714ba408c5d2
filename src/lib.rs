pub mod avatar;
pub mod client;
pub mod config;
pub mod expression;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod protocol;
pub mod sanitize;
pub mod synthesis;

pub use avatar::{AvatarChannel, AvatarCommand, AvatarSignal, CommandSink};
pub use client::{ExchangeReader, Message, MessageStore};
pub use config::Config;
pub use expression::Expression;
pub use http::{create_router, AppState};
pub use llm::{ChatTurn, GeminiClient, ImageData, Role, TextGenerator};
pub use orchestrator::Orchestrator;
pub use protocol::{Event, Frame, FrameReader};
pub use sanitize::sanitize_for_speech;
pub use synthesis::{AudioClip, RenderQueueSynthesizer, SpeechSynthesizer, SynthesisError};
