//! Debate coordination library.
//!
//! This library provides:
//! - A turn controller driving a two-speaker debate round by round
//! - Validation of candidate turns (length, repetition, topic drift)
//! - A deterministic judge scoring the finished transcript
//! - Event sinks for tracing and JSONL logs
//!
//! # Usage
//!
//! ```no_run
//! use debate_coordination::{SessionConfig, SpeakerBindings, TemplateProvider, TurnController};
//!
//! let mut controller = TurnController::open(
//!     "Should AI be regulated like medicine?",
//!     SpeakerBindings::default(),
//!     SessionConfig::from_env(),
//! )?;
//! let verdict = controller.run(&mut TemplateProvider::new())?;
//! println!("winner: {}", verdict.winner);
//! # Ok::<(), debate_coordination::DebateError>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod debate;

// Re-export key debate types
pub use debate::{
    ConfigError, ContentProvider, DebateError, DebateEvent, DebateEventKind, DebateOutcome,
    DebateState, DebateStatus, EventSink, JsonlSink, Judge, JudgeVerdict, MemoryStore,
    NextAction, PersonaDescriptor, PersonaResolver, ScriptedProvider, SessionConfig, Speaker,
    SpeakerBindings, StaticPersonaResolver, TemplateProvider, Topic, TracingSink, TurnController,
    TurnRecord, TurnRejection, Validator,
};
