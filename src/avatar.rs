//! Cross-context control channel for the embedded avatar renderer.
//!
//! The renderer lives in its own context and is driven by a narrow
//! command set. It signals readiness exactly once; commands issued
//! before that signal are dropped rather than queued, since the
//! renderer cannot replay them meaningfully once it comes up.

use crate::expression::Expression;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outbound commands understood by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AvatarCommand {
    /// Load the expression at a fixed slot index.
    Expression { index: u8 },
    /// Play a voice clip from a resource path.
    Voice { path: String },
    /// Pointer-driven gaze target, normalized to [0, 1].
    Lookat { x: f32, y: f32 },
    /// Return the gaze to neutral.
    Resetlookat,
}

/// Inbound signals from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AvatarSignal {
    /// One-time readiness handshake; gates all outbound commands.
    #[serde(rename = "avatar-ready")]
    AvatarReady,
}

/// Where outbound commands go; the production sink posts across the
/// context boundary, tests capture.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: AvatarCommand) -> Result<()>;
}

impl CommandSink for tokio::sync::mpsc::UnboundedSender<AvatarCommand> {
    fn send(&self, command: AvatarCommand) -> Result<()> {
        tokio::sync::mpsc::UnboundedSender::send(self, command)
            .map_err(|_| anyhow::anyhow!("avatar command channel closed"))
    }
}

/// Session object owning the ready-gate and the command sink.
pub struct AvatarChannel {
    sink: Box<dyn CommandSink>,
    ready: bool,
}

impl AvatarChannel {
    pub fn new(sink: Box<dyn CommandSink>) -> Self {
        Self { sink, ready: false }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn handle_inbound(&mut self, signal: AvatarSignal) {
        match signal {
            AvatarSignal::AvatarReady => self.ready = true,
        }
    }

    /// Send a command if the renderer has signalled readiness.
    ///
    /// Returns `true` when the command was handed to the sink; `false`
    /// when it was dropped at the gate.
    pub fn send(&self, command: AvatarCommand) -> bool {
        if !self.ready {
            debug!("Dropping avatar command before readiness: {:?}", command);
            return false;
        }
        self.sink.send(command).is_ok()
    }

    pub fn set_expression(&self, expression: Expression) -> bool {
        self.send(AvatarCommand::Expression {
            index: expression.avatar_index(),
        })
    }

    pub fn play_voice(&self, path: impl Into<String>) -> bool {
        self.send(AvatarCommand::Voice { path: path.into() })
    }

    pub fn look_at(&self, x: f32, y: f32) -> bool {
        self.send(AvatarCommand::Lookat { x, y })
    }

    pub fn reset_look_at(&self) -> bool {
        self.send(AvatarCommand::Resetlookat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_shapes_on_the_wire() {
        let expression = serde_json::to_value(AvatarCommand::Expression { index: 4 }).unwrap();
        assert_eq!(
            expression,
            serde_json::json!({"type": "expression", "index": 4})
        );

        let lookat = serde_json::to_value(AvatarCommand::Lookat { x: 0.5, y: 0.25 }).unwrap();
        assert_eq!(
            lookat,
            serde_json::json!({"type": "lookat", "x": 0.5, "y": 0.25})
        );

        let reset = serde_json::to_value(AvatarCommand::Resetlookat).unwrap();
        assert_eq!(reset, serde_json::json!({"type": "resetlookat"}));
    }

    #[test]
    fn readiness_signal_parses() {
        let signal: AvatarSignal =
            serde_json::from_value(serde_json::json!({"type": "avatar-ready"})).unwrap();
        assert_eq!(signal, AvatarSignal::AvatarReady);
    }
}
