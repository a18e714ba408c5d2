use serde::{Deserialize, Serialize};
use std::fmt;

/// Facial expression driven on the avatar renderer.
///
/// The vocabulary is closed: the classifier, the wire protocol, and the
/// avatar index table all agree on exactly these seven labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Happy,
    Angry,
    Sad,
    Surprised,
    Smile,
    Hate,
    Fear,
}

/// Fixed iteration order for label matching. First match wins when
/// scanning a raw classifier reply.
pub const VOCABULARY: [Expression; 7] = [
    Expression::Happy,
    Expression::Angry,
    Expression::Sad,
    Expression::Surprised,
    Expression::Smile,
    Expression::Hate,
    Expression::Fear,
];

impl Expression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expression::Happy => "happy",
            Expression::Angry => "angry",
            Expression::Sad => "sad",
            Expression::Surprised => "surprised",
            Expression::Smile => "smile",
            Expression::Hate => "hate",
            Expression::Fear => "fear",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        VOCABULARY.iter().copied().find(|e| e.as_str() == label)
    }

    /// Slot index understood by the embedded avatar renderer.
    pub fn avatar_index(&self) -> u8 {
        match self {
            Expression::Happy => 0,
            Expression::Angry => 1,
            Expression::Sad => 2,
            Expression::Surprised => 3,
            Expression::Smile => 4,
            Expression::Hate => 5,
            Expression::Fear => 6,
        }
    }

    /// Voice speed multiplier applied during synthesis.
    pub fn speed_factor(&self) -> f64 {
        match self {
            Expression::Happy => 1.15,
            Expression::Smile => 1.10,
            Expression::Surprised => 1.05,
            Expression::Angry => 0.95,
            Expression::Sad => 0.85,
            Expression::Hate => 0.90,
            Expression::Fear => 0.95,
        }
    }
}

impl Default for Expression {
    /// Neutral fallback used whenever classification cannot produce a label.
    fn default() -> Self {
        Expression::Smile
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
