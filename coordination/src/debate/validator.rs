//! Candidate-turn validation: emptiness, length, self-repetition, topic drift.

use serde::{Deserialize, Serialize};

use super::config::SessionConfig;
use super::error::TurnRejection;
use super::memory::MemoryStore;
use super::state::Speaker;
use super::text::{sequence_ratio, topic_coverage};
use super::topic::Topic;

/// Validation thresholds, copied out of the session config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Reject when similarity to an own prior turn reaches this.
    pub similarity_threshold: f64,
    /// Reject when topic coverage falls below this.
    pub coherence_threshold: f64,
    pub min_response_chars: usize,
    pub max_response_chars: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for ValidatorConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            coherence_threshold: config.coherence_threshold,
            min_response_chars: config.min_response_chars,
            max_response_chars: config.max_response_chars,
        }
    }
}

/// Scores of a candidate that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceptance {
    /// Highest similarity against the speaker's own prior turns (0 if none).
    pub max_similarity: f64,
    /// Topic keyword coverage.
    pub coherence: f64,
}

/// Stateless validator; reads the transcript, never mutates it.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Run every check in order; the first failure wins.
    pub fn validate(
        &self,
        candidate: &str,
        speaker: Speaker,
        topic: &Topic,
        memory: &MemoryStore,
    ) -> Result<Acceptance, TurnRejection> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(TurnRejection::EmptyResponse);
        }

        let len = trimmed.chars().count();
        if len < self.config.min_response_chars || len > self.config.max_response_chars {
            return Err(TurnRejection::LengthOutOfBounds {
                len,
                min: self.config.min_response_chars,
                max: self.config.max_response_chars,
            });
        }

        let max_similarity = self.check_repetition(trimmed, speaker, memory)?;
        let coherence = self.check_coherence(trimmed, topic)?;

        Ok(Acceptance {
            max_similarity,
            coherence,
        })
    }

    /// Compare against the speaker's own history only.
    fn check_repetition(
        &self,
        candidate: &str,
        speaker: Speaker,
        memory: &MemoryStore,
    ) -> Result<f64, TurnRejection> {
        let mut max_similarity: f64 = 0.0;
        for prior in memory.turns_by(speaker) {
            let similarity = sequence_ratio(candidate, &prior.text);
            if similarity >= self.config.similarity_threshold {
                return Err(TurnRejection::RepetitionDetected {
                    similarity,
                    round: prior.round,
                    threshold: self.config.similarity_threshold,
                });
            }
            max_similarity = max_similarity.max(similarity);
        }
        Ok(max_similarity)
    }

    fn check_coherence(&self, candidate: &str, topic: &Topic) -> Result<f64, TurnRejection> {
        let coherence = Self::coherence(candidate, topic);
        if coherence < self.config.coherence_threshold {
            return Err(TurnRejection::TopicDriftDetected {
                coherence,
                threshold: self.config.coherence_threshold,
            });
        }
        Ok(coherence)
    }

    /// Fraction of topic terms the candidate covers.
    pub fn coherence(candidate: &str, topic: &Topic) -> f64 {
        topic_coverage(topic.as_str(), candidate)
    }
}
