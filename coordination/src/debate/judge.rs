//! Judge: scores a finished transcript and picks a winner.
//!
//! Scoring is a pure function of (topic, bindings, memory). Each speaker
//! gets three sub-scores in [0, 1]:
//!
//! | criterion        | weight | measure                                        |
//! |------------------|--------|------------------------------------------------|
//! | argument quality | 0.4    | rhetorical markers per turn, averaged          |
//! | coherence        | 0.3    | keyword coverage between consecutive own turns |
//! | relevance        | 0.3    | topic coverage per turn, averaged              |
//!
//! Ties on the weighted total fall through to argument quality, then
//! relevance, then speaker A.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::memory::{MemoryStore, TurnRecord};
use super::provider::SpeakerBindings;
use super::state::Speaker;
use super::text::{keyword_coverage, keywords, topic_coverage, truncate_chars, words};
use super::topic::Topic;

/// Scores closer than this are treated as equal.
const SCORE_EPSILON: f64 = 1e-9;
/// Turns shorter than this (chars) lose [`SHORT_TURN_PENALTY`].
const SHORT_TURN_CHARS: usize = 50;
const SHORT_TURN_PENALTY: f64 = 0.2;
const BASE_QUALITY: f64 = 0.5;
/// Per-turn truncation in the verdict summary.
const SUMMARY_TURN_CHARS: usize = 150;

const EVIDENCE_MARKERS: &[&str] = &[
    "evidence",
    "data",
    "study",
    "studies",
    "research",
    "empirical",
    "analysis",
    "statistics",
    "statistical",
    "experiment",
    "trials",
];
const NORMATIVE_MARKERS: &[&str] = &[
    "ethical",
    "moral",
    "justice",
    "principle",
    "virtue",
    "duty",
    "rights",
];
const REASONING_MARKERS: &[&str] = &[
    "therefore",
    "because",
    "since",
    "thus",
    "hence",
    "consequently",
    "conclusion",
];
const EXAMPLE_MARKERS: &[&str] = &["example", "instance", "precedent", "case"];
const COUNTERPOINT_MARKERS: &[&str] = &["however", "consider", "perspective"];
const COUNTERPOINT_PHRASE: &str = "on the other hand";

/// Relative weight of each criterion in the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the marker-based quality score.
    pub argument_quality: f64,
    /// Weight of consistency between a speaker's own turns.
    pub coherence: f64,
    /// Weight of topic coverage.
    pub relevance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            argument_quality: 0.4,
            coherence: 0.3,
            relevance: 0.3,
        }
    }
}

/// Per-speaker sub-scores and weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Mean marker-based quality over the speaker's turns.
    pub argument_quality: f64,
    /// Mean keyword coverage between consecutive own turns (1.0 below two turns).
    pub coherence: f64,
    /// Mean topic coverage over the speaker's turns.
    pub relevance: f64,
    /// Weighted sum of the three sub-scores.
    pub total: f64,
}

/// Which comparison settled the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidingCriterion {
    /// Weighted totals differed.
    FinalScore,
    /// Totals tied; argument quality differed.
    ArgumentQuality,
    /// Totals and quality tied; relevance differed.
    Relevance,
    /// Everything tied; A wins by convention.
    FirstSpeaker,
}

impl std::fmt::Display for DecidingCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FinalScore => write!(f, "final score"),
            Self::ArgumentQuality => write!(f, "argument quality"),
            Self::Relevance => write!(f, "relevance"),
            Self::FirstSpeaker => write!(f, "first speaker"),
        }
    }
}

/// Final, immutable judgement of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Declared winner.
    pub winner: Speaker,
    /// Weighted total per speaker.
    pub scores: BTreeMap<Speaker, f64>,
    /// Sub-scores per speaker.
    pub breakdown: BTreeMap<Speaker, ScoreCard>,
    /// Comparison that settled the winner.
    pub deciding: DecidingCriterion,
    /// One-sentence explanation of the decision.
    pub rationale: String,
    /// Multi-line digest of topic, participants, turns and scores.
    pub summary: String,
}

impl JudgeVerdict {
    pub fn score(&self, speaker: Speaker) -> f64 {
        self.scores.get(&speaker).copied().unwrap_or(0.0)
    }
}

/// Transcript scorer.
#[derive(Debug, Clone, Default)]
pub struct Judge {
    weights: ScoringWeights,
}

impl Judge {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score both speakers and declare a winner.
    pub fn evaluate(
        &self,
        topic: &Topic,
        bindings: &SpeakerBindings,
        memory: &MemoryStore,
    ) -> JudgeVerdict {
        let breakdown: BTreeMap<Speaker, ScoreCard> = Speaker::ALL
            .iter()
            .map(|&speaker| {
                let turns: Vec<&TurnRecord> = memory.turns_by(speaker).collect();
                (speaker, self.score_card(topic, &turns))
            })
            .collect();
        let scores = breakdown.iter().map(|(s, c)| (*s, c.total)).collect();

        let card_a = breakdown[&Speaker::A];
        let card_b = breakdown[&Speaker::B];
        let (winner, deciding) = decide(&card_a, &card_b);
        let rationale = rationale(winner, deciding, &card_a, &card_b);
        let summary = summarize(topic, bindings, memory.transcript(), &card_a, &card_b);

        JudgeVerdict {
            winner,
            scores,
            breakdown,
            deciding,
            rationale,
            summary,
        }
    }

    fn score_card(&self, topic: &Topic, turns: &[&TurnRecord]) -> ScoreCard {
        let argument_quality = mean(turns.iter().map(|t| argument_quality(&t.text)));
        let coherence = if turns.len() < 2 {
            1.0
        } else {
            mean(
                turns
                    .windows(2)
                    .map(|w| keyword_coverage(&keywords(&w[0].text), &keywords(&w[1].text))),
            )
        };
        let relevance = mean(
            turns
                .iter()
                .map(|t| topic_coverage(topic.as_str(), &t.text)),
        );
        let total = self.weights.argument_quality * argument_quality
            + self.weights.coherence * coherence
            + self.weights.relevance * relevance;

        ScoreCard {
            argument_quality,
            coherence,
            relevance,
            total,
        }
    }
}

/// Marker-based quality of a single turn, clamped to [0, 1].
pub fn argument_quality(text: &str) -> f64 {
    let tokens: BTreeSet<String> = words(text).into_iter().collect();
    let distinct = |markers: &[&str]| markers.iter().filter(|m| tokens.contains(**m)).count();
    let any = |markers: &[&str]| markers.iter().any(|m| tokens.contains(*m));

    let mut score = BASE_QUALITY;
    score += 0.1 * distinct(EVIDENCE_MARKERS) as f64;
    score += 0.1 * distinct(NORMATIVE_MARKERS) as f64;
    if any(REASONING_MARKERS) {
        score += 0.1;
    }
    if any(EXAMPLE_MARKERS) {
        score += 0.05;
    }
    if any(COUNTERPOINT_MARKERS) || text.to_lowercase().contains(COUNTERPOINT_PHRASE) {
        score += 0.05;
    }
    if text.trim().chars().count() < SHORT_TURN_CHARS {
        score -= SHORT_TURN_PENALTY;
    }
    score.clamp(0.0, 1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Compare one criterion; `None` when tied.
fn compare(a: f64, b: f64) -> Option<Speaker> {
    if (a - b).abs() <= SCORE_EPSILON {
        None
    } else if a > b {
        Some(Speaker::A)
    } else {
        Some(Speaker::B)
    }
}

fn decide(a: &ScoreCard, b: &ScoreCard) -> (Speaker, DecidingCriterion) {
    if let Some(winner) = compare(a.total, b.total) {
        return (winner, DecidingCriterion::FinalScore);
    }
    if let Some(winner) = compare(a.argument_quality, b.argument_quality) {
        return (winner, DecidingCriterion::ArgumentQuality);
    }
    if let Some(winner) = compare(a.relevance, b.relevance) {
        return (winner, DecidingCriterion::Relevance);
    }
    (Speaker::A, DecidingCriterion::FirstSpeaker)
}

fn rationale(winner: Speaker, deciding: DecidingCriterion, a: &ScoreCard, b: &ScoreCard) -> String {
    match deciding {
        DecidingCriterion::FinalScore => format!(
            "Speaker {} wins on final score ({:.3} vs {:.3}).",
            winner, a.total, b.total
        ),
        DecidingCriterion::ArgumentQuality => format!(
            "Final scores tied at {:.3}; speaker {} wins on argument quality ({:.3} vs {:.3}).",
            a.total, winner, a.argument_quality, b.argument_quality
        ),
        DecidingCriterion::Relevance => format!(
            "Final scores and argument quality tied; speaker {} wins on relevance ({:.3} vs {:.3}).",
            winner, a.relevance, b.relevance
        ),
        DecidingCriterion::FirstSpeaker => format!(
            "All criteria tied at {:.3}; speaker {} wins as first speaker.",
            a.total, winner
        ),
    }
}

/// Whether rounds run 1, 2, 3... with the owning speaker on each.
fn alternates(transcript: &[TurnRecord]) -> bool {
    transcript
        .iter()
        .enumerate()
        .all(|(i, t)| t.round == i as u32 + 1 && t.speaker == Speaker::for_round(t.round))
}

fn summarize(
    topic: &Topic,
    bindings: &SpeakerBindings,
    transcript: &[TurnRecord],
    a: &ScoreCard,
    b: &ScoreCard,
) -> String {
    let mut lines = vec![
        format!("Topic: {}", topic),
        format!(
            "Participants: A ({}) vs B ({})",
            bindings.a.label, bindings.b.label
        ),
        format!("Rounds: {}", transcript.len()),
        format!(
            "Turn order: {}",
            if alternates(transcript) {
                "alternating"
            } else {
                "irregular"
            }
        ),
    ];
    for turn in transcript {
        lines.push(format!(
            "R{} {} ({}): {}",
            turn.round,
            turn.speaker,
            turn.persona,
            truncate_chars(&turn.text, SUMMARY_TURN_CHARS)
        ));
    }
    for (speaker, card) in [(Speaker::A, a), (Speaker::B, b)] {
        lines.push(format!(
            "Scores {}: quality={:.3} coherence={:.3} relevance={:.3} total={:.3}",
            speaker, card.argument_quality, card.coherence, card.relevance, card.total
        ));
    }
    lines.join("\n")
}
