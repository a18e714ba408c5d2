use crate::orchestrator::Orchestrator;
use crate::synthesis::SpeechSynthesizer;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Drives one event-stream run per chat request.
    pub orchestrator: Arc<Orchestrator>,

    /// Used directly by the standalone TTS endpoint.
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            orchestrator,
            synthesizer,
        }
    }
}
