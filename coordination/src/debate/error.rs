//! Debate error types.
//!
//! [`TurnRejection`] covers everything that can go wrong with a single
//! candidate turn and is recoverable through the retry budget.
//! [`DebateError`] is what the controller surfaces to its caller.

use thiserror::Error;

use super::config::ConfigError;
use super::state::{DebateStatus, Speaker};

/// Why a candidate turn was not accepted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurnRejection {
    #[error("empty response")]
    EmptyResponse,

    #[error("response length {len} outside {min}..={max} chars")]
    LengthOutOfBounds { len: usize, min: usize, max: usize },

    #[error("repetition detected: similarity {similarity:.3} with own round {round} (threshold {threshold:.2})")]
    RepetitionDetected {
        similarity: f64,
        round: u32,
        threshold: f64,
    },

    #[error("topic drift detected: coherence {coherence:.3} below {threshold:.2}")]
    TopicDriftDetected { coherence: f64, threshold: f64 },

    #[error("generation failed: {reason}")]
    GenerationFailure { reason: String },

    #[error("generation timed out ({elapsed_ms}ms / {budget_ms}ms)")]
    GenerationTimeout { elapsed_ms: u64, budget_ms: u64 },
}

impl TurnRejection {
    /// Machine-readable code used in emitted events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::LengthOutOfBounds { .. } => "LENGTH_OUT_OF_BOUNDS",
            Self::RepetitionDetected { .. } => "REPETITION_DETECTED",
            Self::TopicDriftDetected { .. } => "TOPIC_DRIFT_DETECTED",
            Self::GenerationFailure { .. } => "GENERATION_FAILURE",
            Self::GenerationTimeout { .. } => "GENERATION_TIMEOUT",
        }
    }
}

/// Errors surfaced by the turn controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DebateError {
    #[error("invalid topic: {reason}")]
    InvalidTopic { reason: String },

    #[error("turn order violation in round {round}: expected speaker {expected}, got {actual}")]
    TurnOrderViolation {
        round: u32,
        expected: Speaker,
        actual: Speaker,
    },

    #[error("invalid state transition: cannot {action} while {from}")]
    InvalidStateTransition { from: DebateStatus, action: String },

    #[error("out-of-order append: expected round {expected_round} by {expected_speaker}, got round {round} by {speaker}")]
    OutOfOrderAppend {
        expected_round: u32,
        expected_speaker: Speaker,
        round: u32,
        speaker: Speaker,
    },

    #[error("turn rejected: {0}")]
    Rejected(#[from] TurnRejection),

    #[error("round {round} aborted after {attempts} rejected candidates: {last}")]
    RetriesExhausted {
        round: u32,
        attempts: u32,
        last: TurnRejection,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl DebateError {
    /// Whether the caller may try again with another candidate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::TurnOrderViolation { .. })
    }
}
