//! Debate memory: the append-only transcript and per-speaker context.
//!
//! The store enforces round order on its own: a record is accepted only if
//! it is exactly the next round, spoken by the speaker that owns it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DebateError;
use super::state::Speaker;
use super::text::truncate_chars;

/// Derived statistics stored alongside a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMeta {
    /// Length of the stored text in chars.
    pub char_count: usize,
    /// Distinct whitespace-separated words.
    pub unique_words: usize,
}

/// One accepted turn. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Global round (1-indexed).
    pub round: u32,
    /// Speaker owning the round.
    pub speaker: Speaker,
    /// Persona label bound to the speaker.
    pub persona: String,
    /// Accepted text, trimmed.
    pub text: String,
    /// When the turn was accepted.
    pub timestamp: DateTime<Utc>,
    /// Derived statistics.
    pub meta: TurnMeta,
}

impl TurnRecord {
    pub fn new(round: u32, speaker: Speaker, persona: &str, text: &str) -> Self {
        let unique_words = text.split_whitespace().collect::<BTreeSet<_>>().len();
        Self {
            round,
            speaker,
            persona: persona.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            meta: TurnMeta {
                char_count: text.chars().count(),
                unique_words,
            },
        }
    }
}

/// Context handed to the content provider for one turn.
#[derive(Debug, Clone)]
pub struct SpeakerContext<'a> {
    /// Speaker the context was built for.
    pub speaker: Speaker,
    /// The most recent turns, oldest first.
    pub recent: &'a [TurnRecord],
    /// Condensed view of the whole transcript.
    pub summary: String,
}

impl SpeakerContext<'_> {
    /// The last turn in the window, if any.
    pub fn last_turn(&self) -> Option<&TurnRecord> {
        self.recent.last()
    }
}

/// Append-only transcript store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    turns: Vec<TurnRecord>,
    context_window: usize,
}

impl MemoryStore {
    /// Create an empty store handing out at most `context_window` turns.
    pub fn new(context_window: usize) -> Self {
        Self {
            turns: Vec::new(),
            context_window: context_window.max(1),
        }
    }

    /// Round of the last recorded turn (0 when empty).
    pub fn current_round(&self) -> u32 {
        self.turns.last().map(|t| t.round).unwrap_or(0)
    }

    /// Speaker expected to record the next turn.
    pub fn next_speaker(&self) -> Speaker {
        Speaker::for_round(self.current_round() + 1)
    }

    /// Append a turn; it must be the next round by its owning speaker.
    pub fn record(&mut self, turn: TurnRecord) -> Result<(), DebateError> {
        let expected_round = self.current_round() + 1;
        let expected_speaker = self.next_speaker();
        if turn.round != expected_round || turn.speaker != expected_speaker {
            return Err(DebateError::OutOfOrderAppend {
                expected_round,
                expected_speaker,
                round: turn.round,
                speaker: turn.speaker,
            });
        }
        self.turns.push(turn);
        Ok(())
    }

    /// The last `context_window` turns, visible to either speaker.
    pub fn context_for(&self, speaker: Speaker) -> SpeakerContext<'_> {
        let start = self.turns.len().saturating_sub(self.context_window);
        SpeakerContext {
            speaker,
            recent: &self.turns[start..],
            summary: self.summary(),
        }
    }

    /// Full transcript in round order.
    pub fn transcript(&self) -> &[TurnRecord] {
        &self.turns
    }

    /// Turns by one speaker, in round order.
    pub fn turns_by(&self, speaker: Speaker) -> impl Iterator<Item = &TurnRecord> {
        self.turns.iter().filter(move |t| t.speaker == speaker)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Deterministic, order-preserving condensation of the transcript.
    pub fn summary(&self) -> String {
        if self.turns.is_empty() {
            return "Debate not started.".to_string();
        }
        let mut parts = vec![format!("Debate is at round {}.", self.current_round())];
        for turn in &self.turns {
            parts.push(format!(
                "[R{} {}/{}] {}",
                turn.round,
                turn.speaker,
                turn.persona,
                truncate_chars(&turn.text, 100)
            ));
        }
        parts.join(" ")
    }
}
