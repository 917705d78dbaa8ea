//! Debate events and sinks.
//!
//! The controller emits one [`DebateEvent`] per status transition, turn
//! outcome and verdict. Events are kept in the controller's history and
//! forwarded to every registered [`EventSink`].

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::state::Speaker;

/// Kind of a debate event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebateEventKind {
    /// Session status changed.
    StateTransition,
    /// A candidate was recorded.
    TurnAccepted,
    /// A candidate failed validation or generation.
    TurnRejected,
    /// The wrong speaker submitted.
    TurnOrderViolation,
    /// A round ran out of retries; the session aborts.
    RetriesExhausted,
    /// The judge ruled.
    Verdict,
}

impl DebateEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateTransition => "STATE_TRANSITION",
            Self::TurnAccepted => "TURN_ACCEPTED",
            Self::TurnRejected => "TURN_REJECTED",
            Self::TurnOrderViolation => "TURN_ORDER_VIOLATION",
            Self::RetriesExhausted => "RETRIES_EXHAUSTED",
            Self::Verdict => "VERDICT",
        }
    }

    /// Whether the event reports a problem with the session.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TurnRejected | Self::TurnOrderViolation | Self::RetriesExhausted
        )
    }
}

impl std::fmt::Display for DebateEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateEvent {
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: DebateEventKind,
    /// Round current at emission.
    pub round: u32,
    /// Speaker the event concerns, if any.
    pub speaker: Option<Speaker>,
    /// Kind-specific payload.
    pub details: serde_json::Value,
}

impl DebateEvent {
    pub fn new(
        event_type: DebateEventKind,
        round: u32,
        speaker: Option<Speaker>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            round,
            speaker,
            details,
        }
    }
}

/// Receives every event the controller emits.
pub trait EventSink {
    fn emit(&mut self, event: &DebateEvent);
}

/// Logs events through `tracing`; failures at warn level.
///
/// The controller already logs transitions and turns itself. Attach this
/// only where events arrive from elsewhere or the controller's target is
/// filtered out.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &DebateEvent) {
        let speaker = event.speaker.map(|s| s.to_string()).unwrap_or_default();
        if event.event_type.is_failure() {
            warn!(
                event_type = %event.event_type,
                round = event.round,
                speaker = %speaker,
                details = %event.details,
                "debate event"
            );
        } else {
            info!(
                event_type = %event.event_type,
                round = event.round,
                speaker = %speaker,
                details = %event.details,
                "debate event"
            );
        }
    }
}

/// Writes one JSON object per line.
///
/// Write errors are logged and swallowed so a broken log file never stops
/// a session.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonlSink<W> {
    fn emit(&mut self, event: &DebateEvent) {
        let result = serde_json::to_string(event)
            .map_err(std::io::Error::other)
            .and_then(|line| writeln!(self.writer, "{}", line))
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!(error = %e, event_type = %event.event_type, "failed to write debate event");
        }
    }
}
