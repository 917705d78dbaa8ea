//! Turn controller: drives a session from topic to verdict.
//!
//! Ties together the state machine, memory store, validator and judge.
//! The controller owns all mutable session state; collaborators only read.
//!
//! Usage:
//! 1. `open()` with a raw topic, persona bindings and a config
//! 2. `start()` to begin round 1
//! 3. `submit_turn()` per candidate, or `run_round()` / `run()` with a
//!    [`ContentProvider`]
//! 4. `verdict()` / `outcome()` once the session is terminal

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::error::{DebateError, TurnRejection};
use super::events::{DebateEvent, DebateEventKind, EventSink};
use super::judge::{Judge, JudgeVerdict};
use super::memory::{MemoryStore, TurnRecord};
use super::provider::{ContentProvider, SpeakerBindings, TurnRequest};
use super::state::{DebateState, DebateStatus, Speaker};
use super::topic::Topic;
use super::validator::{Acceptance, Validator, ValidatorConfig};

/// What the controller expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Waiting for `speaker` to take `round`.
    AwaitTurn { round: u32, speaker: Speaker },
    /// Verdict recorded; call `outcome()`.
    Complete,
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitTurn { round, speaker } => {
                write!(f, "await_turn(round {}, speaker {})", round, speaker)
            }
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Snapshot of a terminal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOutcome {
    /// Terminal status.
    pub status: DebateStatus,
    /// Rounds with an accepted turn.
    pub rounds_completed: u32,
    /// Full session state at the end.
    pub state: DebateState,
    /// Accepted turns in round order.
    pub transcript: Vec<TurnRecord>,
    /// Present only when the session completed.
    pub verdict: Option<JudgeVerdict>,
}

impl DebateOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == DebateStatus::Complete
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let result = match (&self.verdict, &self.state.abort_reason) {
            (Some(v), _) => format!("winner={}", v.winner),
            (None, Some(reason)) => format!("reason={}", reason),
            (None, None) => "no verdict".to_string(),
        };
        format!(
            "[{}] {}/{} rounds | {} | topic={}",
            self.status.to_string().to_uppercase(),
            self.rounds_completed,
            self.state.total_rounds,
            result,
            self.state.topic
        )
    }
}

/// Finite-state machine enforcing round count, alternation and retries.
pub struct TurnController {
    state: DebateState,
    memory: MemoryStore,
    validator: Validator,
    judge: Judge,
    config: SessionConfig,
    bindings: SpeakerBindings,
    verdict: Option<JudgeVerdict>,
    /// Rejections counted against the current round.
    round_rejections: u32,
    events: Vec<DebateEvent>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl TurnController {
    /// Validate the config and topic and create a session in `NotStarted`.
    pub fn open(
        raw_topic: &str,
        bindings: SpeakerBindings,
        config: SessionConfig,
    ) -> Result<Self, DebateError> {
        config.validate()?;
        let topic = Topic::parse(raw_topic, &config.blocked_topic_terms)?;
        let id = Uuid::new_v4().to_string();

        info!(
            session_id = %id,
            topic = %topic,
            total_rounds = config.total_rounds,
            speaker_a = %bindings.a.label,
            speaker_b = %bindings.b.label,
            "Debate session opened"
        );

        Ok(Self {
            state: DebateState::new(&id, topic, config.total_rounds),
            memory: MemoryStore::new(config.context_window),
            validator: Validator::new(ValidatorConfig::from(&config)),
            judge: Judge::default(),
            config,
            bindings,
            verdict: None,
            round_rejections: 0,
            events: Vec::new(),
            sinks: Vec::new(),
        })
    }

    /// Register an event sink.
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// `NotStarted → InProgress`, round 1, speaker A.
    pub fn start(&mut self) -> Result<NextAction, DebateError> {
        if self.state.status != DebateStatus::NotStarted {
            return Err(DebateError::InvalidStateTransition {
                from: self.state.status,
                action: "start".to_string(),
            });
        }
        self.transition(DebateStatus::InProgress, "debate started")?;
        self.round_rejections = 0;
        Ok(self.await_next())
    }

    /// Offer a candidate turn for the current round.
    ///
    /// Order is checked before validation and a violation mutates nothing
    /// beyond the event log. Rejections count against the round; once they
    /// exceed `max_retries` the session aborts.
    pub fn submit_turn(&mut self, speaker: Speaker, text: &str) -> Result<NextAction, DebateError> {
        self.require_in_progress("submit a turn")?;

        let round = self.state.current_round;
        let expected = Speaker::for_round(round);
        if speaker != expected {
            warn!(
                session_id = %self.state.id,
                round,
                expected = %expected,
                actual = %speaker,
                "Turn order violation"
            );
            self.emit(
                DebateEventKind::TurnOrderViolation,
                round,
                Some(speaker),
                json!({ "expected": expected, "actual": speaker }),
            );
            return Err(DebateError::TurnOrderViolation {
                round,
                expected,
                actual: speaker,
            });
        }

        match self
            .validator
            .validate(text, speaker, &self.state.topic, &self.memory)
        {
            Ok(acceptance) => self.accept(round, speaker, text, acceptance),
            Err(rejection) => self.reject(round, speaker, rejection),
        }
    }

    /// Count a provider-side failure against the current round.
    pub fn reject_candidate(
        &mut self,
        rejection: TurnRejection,
    ) -> Result<NextAction, DebateError> {
        self.require_in_progress("reject a candidate")?;
        let round = self.state.current_round;
        self.reject(round, Speaker::for_round(round), rejection)
    }

    /// Ask `provider` for candidates until the round is accepted or its
    /// retry budget runs out.
    pub fn run_round(
        &mut self,
        provider: &mut dyn ContentProvider,
    ) -> Result<NextAction, DebateError> {
        self.require_in_progress("run a round")?;
        let round = self.state.current_round;
        let speaker = Speaker::for_round(round);

        loop {
            let started = Instant::now();
            let generated = {
                let request = TurnRequest {
                    round,
                    speaker,
                    persona: self.bindings.persona(speaker),
                    topic: &self.state.topic,
                    context: self.memory.context_for(speaker),
                };
                provider.generate(&request)
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;
            debug!(
                session_id = %self.state.id,
                round,
                speaker = %speaker,
                elapsed_ms,
                attempt = self.round_rejections + 1,
                "Candidate generated"
            );

            let result = match generated {
                Err(e) => {
                    self.reject_candidate(TurnRejection::GenerationFailure { reason: e.reason })
                }
                Ok(_) if self.over_budget(elapsed_ms) => {
                    let budget_ms = self.config.generation_timeout_ms.unwrap_or_default();
                    self.reject_candidate(TurnRejection::GenerationTimeout {
                        elapsed_ms,
                        budget_ms,
                    })
                }
                Ok(text) => self.submit_turn(speaker, &text),
            };

            match result {
                Err(DebateError::Rejected(_)) => continue,
                other => return other,
            }
        }
    }

    /// Run the whole session, starting it if needed.
    pub fn run(
        &mut self,
        provider: &mut dyn ContentProvider,
    ) -> Result<&JudgeVerdict, DebateError> {
        if self.state.status == DebateStatus::NotStarted {
            self.start()?;
        }
        while self.state.status == DebateStatus::InProgress {
            self.run_round(provider)?;
        }
        let status = self.state.status;
        self.verdict
            .as_ref()
            .ok_or_else(|| DebateError::InvalidStateTransition {
                from: status,
                action: "read the verdict".to_string(),
            })
    }

    /// Operator termination.
    pub fn abort(&mut self, reason: &str) -> Result<(), DebateError> {
        if self.state.is_terminal() {
            return Err(DebateError::InvalidStateTransition {
                from: self.state.status,
                action: "abort".to_string(),
            });
        }
        warn!(session_id = %self.state.id, reason, "Debate aborted by operator");
        self.transition(DebateStatus::Aborted, reason)
    }

    pub fn state(&self) -> &DebateState {
        &self.state
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn verdict(&self) -> Option<&JudgeVerdict> {
        self.verdict.as_ref()
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> &[DebateEvent] {
        &self.events
    }

    pub fn expected_speaker(&self) -> Option<Speaker> {
        self.state.expected_speaker()
    }

    pub fn bindings(&self) -> &SpeakerBindings {
        &self.bindings
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Rejections counted against the current round so far.
    pub fn round_rejections(&self) -> u32 {
        self.round_rejections
    }

    /// Snapshot of the session once it is terminal.
    pub fn outcome(&self) -> Option<DebateOutcome> {
        if !self.state.is_terminal() {
            return None;
        }
        Some(DebateOutcome {
            status: self.state.status,
            rounds_completed: self.state.rounds_completed,
            state: self.state.clone(),
            transcript: self.memory.transcript().to_vec(),
            verdict: self.verdict.clone(),
        })
    }

    // -- internals --

    fn require_in_progress(&self, action: &str) -> Result<(), DebateError> {
        if self.state.status != DebateStatus::InProgress {
            return Err(DebateError::InvalidStateTransition {
                from: self.state.status,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn over_budget(&self, elapsed_ms: u64) -> bool {
        self.config
            .generation_timeout_ms
            .is_some_and(|budget| elapsed_ms > budget)
    }

    fn await_next(&self) -> NextAction {
        NextAction::AwaitTurn {
            round: self.state.current_round,
            speaker: Speaker::for_round(self.state.current_round),
        }
    }

    fn accept(
        &mut self,
        round: u32,
        speaker: Speaker,
        text: &str,
        acceptance: Acceptance,
    ) -> Result<NextAction, DebateError> {
        let persona = self.bindings.persona(speaker).label.clone();
        let record = TurnRecord::new(round, speaker, &persona, text.trim());
        let char_count = record.meta.char_count;
        self.memory.record(record)?;
        self.state.advance();
        self.round_rejections = 0;

        info!(
            session_id = %self.state.id,
            round,
            speaker = %speaker,
            coherence = acceptance.coherence,
            max_similarity = acceptance.max_similarity,
            "Turn accepted"
        );
        self.emit(
            DebateEventKind::TurnAccepted,
            round,
            Some(speaker),
            json!({
                "persona": persona,
                "char_count": char_count,
                "coherence": acceptance.coherence,
                "max_similarity": acceptance.max_similarity,
            }),
        );

        if self.state.all_rounds_completed() {
            self.conclude()?;
            return Ok(NextAction::Complete);
        }
        Ok(self.await_next())
    }

    fn reject(
        &mut self,
        round: u32,
        speaker: Speaker,
        rejection: TurnRejection,
    ) -> Result<NextAction, DebateError> {
        self.round_rejections += 1;
        let attempts = self.round_rejections;

        warn!(
            session_id = %self.state.id,
            round,
            speaker = %speaker,
            code = rejection.code(),
            attempt = attempts,
            max_retries = self.config.max_retries,
            "Turn rejected: {}",
            rejection
        );
        self.emit(
            DebateEventKind::TurnRejected,
            round,
            Some(speaker),
            json!({
                "code": rejection.code(),
                "reason": rejection.to_string(),
                "attempt": attempts,
            }),
        );

        if attempts <= self.config.max_retries {
            return Err(DebateError::Rejected(rejection));
        }

        self.emit(
            DebateEventKind::RetriesExhausted,
            round,
            Some(speaker),
            json!({ "attempts": attempts, "last": rejection.code() }),
        );
        self.transition(DebateStatus::Aborted, &rejection.to_string())?;
        Err(DebateError::RetriesExhausted {
            round,
            attempts,
            last: rejection,
        })
    }

    fn conclude(&mut self) -> Result<(), DebateError> {
        self.transition(DebateStatus::Judging, "all rounds completed")?;

        let verdict = self
            .judge
            .evaluate(&self.state.topic, &self.bindings, &self.memory);
        self.state.winner = Some(verdict.winner);

        info!(
            session_id = %self.state.id,
            winner = %verdict.winner,
            deciding = %verdict.deciding,
            score_a = verdict.score(Speaker::A),
            score_b = verdict.score(Speaker::B),
            "Verdict reached"
        );
        self.emit(
            DebateEventKind::Verdict,
            self.state.current_round,
            Some(verdict.winner),
            json!({
                "winner": verdict.winner,
                "scores": verdict.scores,
                "deciding": verdict.deciding,
                "rationale": verdict.rationale,
            }),
        );
        self.verdict = Some(verdict);

        self.transition(DebateStatus::Complete, "verdict recorded")
    }

    fn transition(&mut self, to: DebateStatus, reason: &str) -> Result<(), DebateError> {
        let record = self.state.transition(to, reason)?;
        info!(
            session_id = %self.state.id,
            from = %record.from,
            to = %record.to,
            reason,
            "Debate status changed"
        );
        self.emit(
            DebateEventKind::StateTransition,
            self.state.current_round,
            None,
            json!({ "from": record.from, "to": record.to, "reason": reason }),
        );
        Ok(())
    }

    fn emit(
        &mut self,
        kind: DebateEventKind,
        round: u32,
        speaker: Option<Speaker>,
        details: serde_json::Value,
    ) {
        let event = DebateEvent::new(kind, round, speaker, details);
        for sink in &mut self.sinks {
            sink.emit(&event);
        }
        self.events.push(event);
    }
}
