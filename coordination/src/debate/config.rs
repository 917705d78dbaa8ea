//! Session configuration: one immutable object handed to every component.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading or validating a [`SessionConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration for one debate session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Global rounds in the session (speakers alternate, A on odd rounds).
    pub total_rounds: u32,
    /// Same-speaker similarity at or above which a turn is a repetition.
    pub similarity_threshold: f64,
    /// Minimum topic keyword coverage for a turn to stay on topic.
    pub coherence_threshold: f64,
    /// Extra candidates requested for a round after the first rejection.
    pub max_retries: u32,
    /// Number of recent turns handed to the content provider.
    pub context_window: usize,
    /// Wall-clock budget for one provider call (None = unlimited).
    pub generation_timeout_ms: Option<u64>,
    /// Minimum trimmed response length in chars.
    pub min_response_chars: usize,
    /// Maximum trimmed response length in chars.
    pub max_response_chars: usize,
    /// Case-insensitive substrings that disqualify a topic.
    pub blocked_topic_terms: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_rounds: 8,
            similarity_threshold: 0.95,
            coherence_threshold: 0.7,
            max_retries: 2,
            context_window: 8,
            generation_timeout_ms: None,
            min_response_chars: 20,
            max_response_chars: 1000,
            blocked_topic_terms: ["spam", "testtest", "xxx", "spamtest"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `DEBATE_*` environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(n) = env_parse("DEBATE_TOTAL_ROUNDS") {
            config.total_rounds = n;
        }
        if let Some(v) = env_parse("DEBATE_SIMILARITY_THRESHOLD") {
            config.similarity_threshold = v;
        }
        if let Some(v) = env_parse("DEBATE_COHERENCE_THRESHOLD") {
            config.coherence_threshold = v;
        }
        if let Some(n) = env_parse("DEBATE_MAX_RETRIES") {
            config.max_retries = n;
        }
        if let Some(n) = env_parse("DEBATE_CONTEXT_WINDOW") {
            config.context_window = n;
        }
        if let Some(ms) = env_parse("DEBATE_GENERATION_TIMEOUT_MS") {
            config.generation_timeout_ms = Some(ms);
        }

        config
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "total_rounds",
                reason: "must be at least 1".to_string(),
            });
        }
        check_unit("similarity_threshold", self.similarity_threshold)?;
        check_unit("coherence_threshold", self.coherence_threshold)?;
        if self.context_window == 0 {
            return Err(ConfigError::Invalid {
                field: "context_window",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_response_chars > self.max_response_chars {
            return Err(ConfigError::Invalid {
                field: "min_response_chars",
                reason: format!(
                    "{} exceeds max_response_chars {}",
                    self.min_response_chars, self.max_response_chars
                ),
            });
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is outside [0, 1]", value),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
