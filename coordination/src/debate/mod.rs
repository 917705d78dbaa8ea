//! Two-speaker debate orchestration.
//!
//! Speakers A and B alternate for a fixed number of rounds (A on odd
//! rounds). Each candidate turn is validated against repetition and topic
//! drift before it enters the transcript; rejected candidates are retried
//! up to a per-round budget. After the last round the judge scores the
//! transcript and declares a winner.
//!
//! # Debate Flow
//!
//! ```text
//! NotStarted → InProgress(round 1..N) → Judging → Complete
//!   │              │    ▲
//!   │              │    └─ accepted turn, rounds left
//!   │              └─ rejected candidate → retry (same round)
//!   │                       └─ retries exhausted → Aborted
//!   └─ abort at any non-terminal point → Aborted
//! ```
//!
//! Content generation sits behind [`ContentProvider`]; the core only
//! consumes and validates text.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod judge;
pub mod memory;
pub mod provider;
pub mod state;
pub mod text;
pub mod topic;
pub mod validator;

pub use config::{ConfigError, SessionConfig};
pub use controller::{DebateOutcome, NextAction, TurnController};
pub use error::{DebateError, TurnRejection};
pub use events::{DebateEvent, DebateEventKind, EventSink, JsonlSink, TracingSink};
pub use judge::{DecidingCriterion, Judge, JudgeVerdict, ScoreCard, ScoringWeights};
pub use memory::{MemoryStore, SpeakerContext, TurnMeta, TurnRecord};
pub use provider::{
    ContentProvider, GenerationError, PersonaDescriptor, PersonaResolver, ScriptedProvider,
    SpeakerBindings, StaticPersonaResolver, TemplateProvider, TurnRequest,
};
pub use state::{DebateState, DebateStatus, Speaker, StatusTransition};
pub use topic::Topic;
pub use validator::{Acceptance, Validator, ValidatorConfig};
