//! Expression classification over the full response text.
//!
//! One secondary completion call maps a response to the closed
//! seven-label vocabulary. Classification never fails from the
//! caller's view: every error path resolves to the neutral default.

use super::TextGenerator;
use crate::expression::{Expression, VOCABULARY};
use tracing::warn;

/// Only this much of the response is sent for classification; tone is
/// established well before 500 characters.
const MAX_CLASSIFIED_CHARS: usize = 500;

const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are an emotion classifier. Given a message, respond with ONLY one of \
these exact words: happy, angry, sad, surprised, smile, hate, fear.

Pick the emotion that best matches the tone:
- \"smile\" = default/neutral/friendly/casual/sarcastic
- \"happy\" = genuinely excited or enthusiastic
- \"angry\" = annoyed, frustrated, or ranting
- \"sad\" = melancholic or sympathetic
- \"surprised\" = shocked or taken aback
- \"hate\" = strong disgust or contempt
- \"fear\" = worried or anxious

Respond with ONLY the single word, nothing else.";

/// Classify the expression for a full response text.
///
/// Infallible: a provider error or an off-vocabulary reply both
/// resolve to [`Expression::Smile`].
pub async fn classify_expression(generator: &dyn TextGenerator, text: &str) -> Expression {
    let excerpt: String = text.chars().take(MAX_CLASSIFIED_CHARS).collect();
    let prompt = format!("Classify the emotion:\n\n{}", excerpt);

    match generator.complete(CLASSIFIER_SYSTEM_PROMPT, &prompt).await {
        Ok(raw) => resolve_label(&raw),
        Err(e) => {
            warn!("Expression classification failed: {:#}", e);
            Expression::default()
        }
    }
}

/// Map a raw classifier reply to a vocabulary label.
///
/// Case-folds and takes the first vocabulary word contained in the
/// reply, in fixed vocabulary order; anything else is the default.
pub fn resolve_label(raw: &str) -> Expression {
    let lowered = raw.trim().to_lowercase();
    VOCABULARY
        .iter()
        .copied()
        .find(|expression| lowered.contains(expression.as_str()))
        .unwrap_or_default()
}
