//! Debate state machine: speakers, statuses, transitions and round tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DebateError;
use super::topic::Topic;

/// One of the two fixed debate participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    /// Speaker owning global round `round` (1-indexed): A on odd, B on even.
    pub fn for_round(round: u32) -> Self {
        if round % 2 == 1 {
            Self::A
        } else {
            Self::B
        }
    }

    /// The other speaker.
    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub const ALL: [Speaker; 2] = [Speaker::A, Speaker::B];
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Lifecycle status of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    /// Session created, topic validated, no turn accepted yet.
    NotStarted,
    /// Turns are being collected.
    InProgress,
    /// All rounds accepted; the judge is scoring.
    Judging,
    /// Verdict stored.
    Complete,
    /// Retry budget exhausted or operator termination.
    Aborted,
}

impl DebateStatus {
    /// Whether this is a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(self) -> &'static [DebateStatus] {
        match self {
            Self::NotStarted => &[Self::InProgress, Self::Aborted],
            Self::InProgress => &[Self::Judging, Self::Aborted],
            Self::Judging => &[Self::Complete, Self::Aborted],
            Self::Complete | Self::Aborted => &[],
        }
    }
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Judging => write!(f, "judging"),
            Self::Complete => write!(f, "complete"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// A status transition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Status before the transition.
    pub from: DebateStatus,
    /// Status after the transition.
    pub to: DebateStatus,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Why the transition happened.
    pub reason: String,
}

/// Round/turn bookkeeping for a session. Mutated only by the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateState {
    /// Session identifier.
    pub id: String,
    /// Validated topic, fixed for the session.
    pub topic: Topic,
    /// Round awaiting a turn; 0 before start, `total_rounds` once finished.
    pub current_round: u32,
    /// Speaker owning the next turn.
    pub next_speaker: Speaker,
    /// Rounds with an accepted turn.
    pub rounds_completed: u32,
    /// Rounds in the session.
    pub total_rounds: u32,
    /// Current lifecycle status.
    pub status: DebateStatus,
    /// Set once the judge has ruled.
    pub winner: Option<Speaker>,
    /// Set when the session aborts.
    pub abort_reason: Option<String>,
    /// Every status change, oldest first.
    pub transitions: Vec<StatusTransition>,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

impl DebateState {
    pub fn new(id: &str, topic: Topic, total_rounds: u32) -> Self {
        Self {
            id: id.to_string(),
            topic,
            current_round: 0,
            next_speaker: Speaker::A,
            rounds_completed: 0,
            total_rounds,
            status: DebateStatus::NotStarted,
            winner: None,
            abort_reason: None,
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Move to `to`, recording the transition.
    pub fn transition(
        &mut self,
        to: DebateStatus,
        reason: &str,
    ) -> Result<StatusTransition, DebateError> {
        if !self.status.valid_transitions().contains(&to) {
            return Err(DebateError::InvalidStateTransition {
                from: self.status,
                action: format!("move to {}", to),
            });
        }

        let record = StatusTransition {
            from: self.status,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        };
        self.transitions.push(record.clone());
        self.status = to;

        match to {
            DebateStatus::InProgress => {
                self.current_round = 1;
                self.next_speaker = Speaker::for_round(1);
            }
            DebateStatus::Aborted => self.abort_reason = Some(reason.to_string()),
            _ => {}
        }

        Ok(record)
    }

    /// Account for an accepted turn in the current round.
    pub fn advance(&mut self) {
        self.rounds_completed += 1;
        if self.rounds_completed < self.total_rounds {
            self.current_round += 1;
        }
        self.next_speaker = self.next_speaker.opponent();
    }

    /// Speaker whose turn is due, if turns are being accepted.
    pub fn expected_speaker(&self) -> Option<Speaker> {
        (self.status == DebateStatus::InProgress).then(|| Speaker::for_round(self.current_round))
    }

    pub fn all_rounds_completed(&self) -> bool {
        self.rounds_completed >= self.total_rounds
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} completed | next={} | topic={}",
            self.status,
            self.current_round,
            self.total_rounds,
            self.rounds_completed,
            self.next_speaker,
            self.topic
        )
    }
}
