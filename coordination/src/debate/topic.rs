//! Debate topic: sanitized and validated once, immutable afterwards.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::DebateError;

/// Minimum topic length in chars.
pub const MIN_TOPIC_CHARS: usize = 10;
/// Maximum topic length in chars.
pub const MAX_TOPIC_CHARS: usize = 200;

static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s?!.,\-']").expect("DISALLOWED_CHARS regex should compile")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex should compile"));

/// A validated debate topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Sanitize `raw` and validate the result.
    ///
    /// Bounds are checked on the sanitized text. `blocked_terms` are matched
    /// case-insensitively as substrings.
    pub fn parse(raw: &str, blocked_terms: &[String]) -> Result<Self, DebateError> {
        let cleaned = sanitize(raw);

        if cleaned.is_empty() {
            return Err(DebateError::InvalidTopic {
                reason: "topic cannot be empty".to_string(),
            });
        }

        let len = cleaned.chars().count();
        if len < MIN_TOPIC_CHARS {
            return Err(DebateError::InvalidTopic {
                reason: format!(
                    "topic must be at least {} characters long (got {})",
                    MIN_TOPIC_CHARS, len
                ),
            });
        }
        if len > MAX_TOPIC_CHARS {
            return Err(DebateError::InvalidTopic {
                reason: format!(
                    "topic must be at most {} characters long (got {})",
                    MAX_TOPIC_CHARS, len
                ),
            });
        }

        let lower = cleaned.to_lowercase();
        if let Some(term) = blocked_terms
            .iter()
            .find(|t| !t.is_empty() && lower.contains(&t.to_lowercase()))
        {
            return Err(DebateError::InvalidTopic {
                reason: format!("topic contains inappropriate content: {}", term),
            });
        }

        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip disallowed characters, collapse whitespace, capitalize.
fn sanitize(raw: &str) -> String {
    let stripped = DISALLOWED_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE_RUN.replace_all(stripped.trim(), " ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
