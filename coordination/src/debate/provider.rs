//! Collaborator seams: persona resolution and content generation.
//!
//! The controller never produces text itself. It asks a [`ContentProvider`]
//! for a candidate and validates whatever comes back. Two deterministic
//! providers live here: [`ScriptedProvider`] replays fixed texts (tests,
//! fixtures), [`TemplateProvider`] fills persona templates with the topic
//! (the CLI demo).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::memory::SpeakerContext;
use super::state::Speaker;
use super::topic::Topic;

/// Opaque persona handed through to the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDescriptor {
    /// Short name, e.g. `scientist`.
    pub label: String,
    /// Style hint for the provider.
    pub description: String,
}

impl PersonaDescriptor {
    pub fn new(label: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
        }
    }
}

/// Resolves a persona label to a descriptor.
pub trait PersonaResolver {
    fn resolve(&self, label: &str) -> PersonaDescriptor;
}

/// Built-in personas; unknown labels get a generic descriptor.
#[derive(Debug, Clone)]
pub struct StaticPersonaResolver {
    known: HashMap<String, String>,
}

impl Default for StaticPersonaResolver {
    fn default() -> Self {
        let mut known = HashMap::new();
        known.insert(
            "scientist".to_string(),
            "Argues from empirical evidence, data and peer-reviewed studies.".to_string(),
        );
        known.insert(
            "philosopher".to_string(),
            "Argues from ethical principles, rights and the nature of a just society.".to_string(),
        );
        Self { known }
    }
}

impl StaticPersonaResolver {
    /// Register or replace a persona description.
    pub fn with_persona(mut self, label: &str, description: &str) -> Self {
        self.known
            .insert(label.to_lowercase(), description.to_string());
        self
    }
}

impl PersonaResolver for StaticPersonaResolver {
    fn resolve(&self, label: &str) -> PersonaDescriptor {
        match self.known.get(&label.to_lowercase()) {
            Some(description) => PersonaDescriptor::new(label, description),
            None => PersonaDescriptor::new(label, &format!("Argues as a {}.", label)),
        }
    }
}

/// Persona bound to each speaker for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerBindings {
    /// Persona of speaker A.
    pub a: PersonaDescriptor,
    /// Persona of speaker B.
    pub b: PersonaDescriptor,
}

impl SpeakerBindings {
    pub fn new(a: PersonaDescriptor, b: PersonaDescriptor) -> Self {
        Self { a, b }
    }

    /// Resolve both labels through `resolver`.
    pub fn resolve(a_label: &str, b_label: &str, resolver: &dyn PersonaResolver) -> Self {
        Self {
            a: resolver.resolve(a_label),
            b: resolver.resolve(b_label),
        }
    }

    pub fn persona(&self, speaker: Speaker) -> &PersonaDescriptor {
        match speaker {
            Speaker::A => &self.a,
            Speaker::B => &self.b,
        }
    }
}

impl Default for SpeakerBindings {
    fn default() -> Self {
        Self::resolve("scientist", "philosopher", &StaticPersonaResolver::default())
    }
}

/// Everything a provider gets to produce one candidate.
#[derive(Debug, Clone)]
pub struct TurnRequest<'a> {
    /// Global round being generated.
    pub round: u32,
    /// Speaker owning the round.
    pub speaker: Speaker,
    /// Persona bound to `speaker`.
    pub persona: &'a PersonaDescriptor,
    pub topic: &'a Topic,
    /// Recent turns and transcript summary.
    pub context: SpeakerContext<'a>,
}

impl TurnRequest<'_> {
    /// 1-indexed turn number within the speaker's own sequence.
    pub fn speaker_turn(&self) -> u32 {
        self.round.div_ceil(2)
    }
}

/// Provider-side failure; counted against the round's retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct GenerationError {
    /// Provider-supplied description.
    pub reason: String,
}

impl GenerationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Produces candidate text for a turn.
pub trait ContentProvider {
    fn generate(&mut self, request: &TurnRequest<'_>) -> Result<String, GenerationError>;
}

/// Replays fixed texts per speaker, one per call.
///
/// Once a speaker's script runs out the last entry is repeated, so a
/// fixture that offers no alternative candidate keeps offering the same one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    scripts: HashMap<Speaker, Vec<String>>,
    cursors: HashMap<Speaker, usize>,
    calls: u32,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one candidate to `speaker`'s script.
    pub fn push(mut self, speaker: Speaker, text: &str) -> Self {
        self.scripts
            .entry(speaker)
            .or_default()
            .push(text.to_string());
        self
    }

    /// Build from one text per round, assigning round `i + 1` to its owner.
    pub fn from_rounds(texts: &[&str]) -> Self {
        texts
            .iter()
            .enumerate()
            .fold(Self::new(), |provider, (i, text)| {
                provider.push(Speaker::for_round(i as u32 + 1), text)
            })
    }

    /// Number of `generate` calls served so far.
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl ContentProvider for ScriptedProvider {
    fn generate(&mut self, request: &TurnRequest<'_>) -> Result<String, GenerationError> {
        self.calls += 1;
        let script = self
            .scripts
            .get(&request.speaker)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                GenerationError::new(format!("no script for speaker {}", request.speaker))
            })?;
        let cursor = self.cursors.entry(request.speaker).or_insert(0);
        let text = script[(*cursor).min(script.len() - 1)].clone();
        *cursor += 1;
        Ok(text)
    }
}

const SCIENTIST_TEMPLATES: &[&str] = &[
    "From a scientific perspective, we must examine the empirical evidence on {topic} Peer-reviewed studies and data analysis should inform our decisions.",
    "The scientific method gives us a framework for evaluating {topic} through controlled experiments and systematic observation of outcomes.",
    "We should rely on statistical evidence and measurable impacts when assessing {topic} rather than anecdotal accounts, because anecdotes mislead.",
    "Longitudinal research on {topic} would reveal causal relationships and unintended consequences; therefore the data must come first.",
];

const PHILOSOPHER_TEMPLATES: &[&str] = &[
    "The debate on {topic} raises fundamental ethical questions about individual rights, social responsibility and the society we want.",
    "When we consider {topic} we must examine our assumptions about human nature, freedom and the moral duty of institutions.",
    "The question {topic} forces us to balance competing principles: liberty versus security, and progress versus tradition. However, justice must guide us.",
    "Ultimately, our answer to {topic} reflects deeper commitments about virtue, a good life and a just society.",
];

const ADVOCATE_TEMPLATES: &[&str] = &[
    "Speaking as a {persona}, the heart of {topic} is who bears the cost and who gains the benefit.",
    "As a {persona}, I see {topic} through practical experience, and the examples on the ground matter most.",
    "My view as a {persona} on {topic} is that good intentions need workable rules, since rules shape outcomes.",
    "To close, a {persona} must answer {topic} by weighing long-term consequences over short-term comfort.",
];

/// Fills persona templates with the topic; deterministic per turn.
#[derive(Debug, Clone, Default)]
pub struct TemplateProvider;

impl TemplateProvider {
    pub fn new() -> Self {
        Self
    }

    fn templates(label: &str) -> &'static [&'static str] {
        match label.to_lowercase().as_str() {
            "scientist" => SCIENTIST_TEMPLATES,
            "philosopher" => PHILOSOPHER_TEMPLATES,
            _ => ADVOCATE_TEMPLATES,
        }
    }
}

impl ContentProvider for TemplateProvider {
    fn generate(&mut self, request: &TurnRequest<'_>) -> Result<String, GenerationError> {
        let templates = Self::templates(&request.persona.label);
        let index = (request.speaker_turn().saturating_sub(1) as usize) % templates.len();
        Ok(templates[index]
            .replace("{topic}", request.topic.as_str())
            .replace("{persona}", &request.persona.label))
    }
}
