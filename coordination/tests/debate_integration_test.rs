//! Debate integration test: exercises the full session loop with
//! deterministic providers (no model calls).
//!
//! Covers: controller ↔ validator ↔ memory ↔ judge ↔ event sinks running
//! together in a single pass.

use std::io::Write;

use debate_coordination::debate::{
    ContentProvider, DebateError, DebateEventKind, DebateStatus, GenerationError, JsonlSink,
    NextAction, ScriptedProvider, SessionConfig, Speaker, SpeakerBindings, StaticPersonaResolver,
    TemplateProvider, TurnController, TurnRejection, TurnRequest,
};

const TOPIC: &str = "Should AI be regulated like medicine?";

const TURNS: [&str; 8] = [
    "AI systems used in medicine should be regulated because clinical trials and empirical data already protect patients from unsafe drugs.",
    "Regulating AI like medicine raises ethical questions about rights and innovation; however, consider how slow approval can harm people.",
    "Research on medical devices shows that regulated approval catches defects early, therefore AI tools deserve the same statistical scrutiny.",
    "A moral principle of justice suggests AI regulation should be proportionate, unlike medicine where every product carries bodily risk.",
    "For example, drug recalls show that post-market surveillance in medicine works, and regulated AI could follow that precedent with audit data.",
    "On the other hand, treating every AI model like a medicine would burden small developers with regulations designed for pharmaceutical giants.",
    "Statistics from medical regulators indicate fewer harmful incidents after oversight; thus AI should be regulated with evidence-based thresholds.",
    "Ultimately our duty is to balance virtue and progress: AI deserves regulation, though not the same rigid regime we apply to medicine.",
];

fn open(config: SessionConfig) -> TurnController {
    TurnController::open(TOPIC, SpeakerBindings::default(), config).unwrap()
}

/// Provider that records the context it was handed.
struct ContextRecorder {
    inner: ScriptedProvider,
    seen_context_lens: Vec<usize>,
    seen_rounds: Vec<u32>,
}

impl ContentProvider for ContextRecorder {
    fn generate(&mut self, request: &TurnRequest<'_>) -> Result<String, GenerationError> {
        self.seen_context_lens.push(request.context.recent.len());
        self.seen_rounds.push(request.round);
        assert_eq!(request.speaker, Speaker::for_round(request.round));
        assert_eq!(request.topic.as_str(), TOPIC);
        self.inner.generate(request)
    }
}

// ── Full session (happy path) ──────────────────────────────────────

#[test]
fn test_full_eight_round_session() {
    let mut controller = open(SessionConfig::default());
    let mut provider = ScriptedProvider::from_rounds(&TURNS);

    let verdict = controller.run(&mut provider).unwrap().clone();

    let state = controller.state();
    assert_eq!(state.status, DebateStatus::Complete);
    assert_eq!(state.rounds_completed, 8);
    assert_eq!(state.current_round, 8);
    assert_eq!(state.winner, Some(verdict.winner));

    let transcript = controller.memory().transcript();
    assert_eq!(transcript.len(), 8);
    for (i, turn) in transcript.iter().enumerate() {
        let round = i as u32 + 1;
        assert_eq!(turn.round, round);
        assert_eq!(turn.speaker, Speaker::for_round(round));
        assert_eq!(turn.text, TURNS[i]);
    }
    assert_eq!(transcript[0].persona, "scientist");
    assert_eq!(transcript[1].persona, "philosopher");

    assert_eq!(verdict.scores.len(), 2);
    assert!(verdict.summary.contains("Turn order: alternating"));
    assert!(verdict.summary.contains("Rounds: 8"));
}

#[test]
fn test_rounds_completed_increments_by_one() {
    let mut controller = open(SessionConfig::default());
    let mut provider = ScriptedProvider::from_rounds(&TURNS);
    controller.start().unwrap();

    let mut previous = 0;
    while controller.state().status == DebateStatus::InProgress {
        controller.run_round(&mut provider).unwrap();
        let completed = controller.state().rounds_completed;
        assert_eq!(completed, previous + 1);
        assert!(completed <= controller.state().total_rounds);
        previous = completed;
    }
    assert_eq!(previous, 8);
}

#[test]
fn test_context_window_passed_to_provider() {
    let config = SessionConfig {
        context_window: 3,
        ..Default::default()
    };
    let mut controller = open(config);
    let mut recorder = ContextRecorder {
        inner: ScriptedProvider::from_rounds(&TURNS),
        seen_context_lens: Vec::new(),
        seen_rounds: Vec::new(),
    };
    controller.run(&mut recorder).unwrap();

    assert_eq!(recorder.seen_rounds, (1..=8).collect::<Vec<_>>());
    assert_eq!(recorder.seen_context_lens, vec![0, 1, 2, 3, 3, 3, 3, 3]);
}

#[test]
fn test_template_provider_session_completes() {
    let mut controller = open(SessionConfig::default());
    let verdict = controller.run(&mut TemplateProvider::new()).unwrap();
    assert!(matches!(verdict.winner, Speaker::A | Speaker::B));
    assert_eq!(controller.memory().len(), 8);
}

#[test]
fn test_custom_personas_flow_into_transcript() {
    let resolver = StaticPersonaResolver::default();
    let bindings = SpeakerBindings::resolve("economist", "scientist", &resolver);
    let config = SessionConfig {
        total_rounds: 4,
        ..Default::default()
    };
    let mut controller = TurnController::open(TOPIC, bindings, config).unwrap();
    controller.run(&mut TemplateProvider::new()).unwrap();

    let personas: Vec<&str> = controller
        .memory()
        .transcript()
        .iter()
        .map(|t| t.persona.as_str())
        .collect();
    assert_eq!(personas, vec!["economist", "scientist", "economist", "scientist"]);
    assert!(controller
        .verdict()
        .unwrap()
        .summary
        .contains("A (economist) vs B (scientist)"));
}

// ── Topic validation ───────────────────────────────────────────────

#[test]
fn test_short_topic_never_reaches_in_progress() {
    let result = TurnController::open("AI", SpeakerBindings::default(), SessionConfig::default());
    match result {
        Err(DebateError::InvalidTopic { reason }) => assert!(reason.contains("at least 10")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("topic \"AI\" should be rejected"),
    }
}

#[test]
fn test_blocked_topic_rejected() {
    let result = TurnController::open(
        "Is spam a legitimate marketing channel?",
        SpeakerBindings::default(),
        SessionConfig::default(),
    );
    assert!(matches!(result, Err(DebateError::InvalidTopic { .. })));
}

// ── Turn order ─────────────────────────────────────────────────────

#[test]
fn test_round_three_tagged_b_is_order_violation() {
    let mut controller = open(SessionConfig::default());
    controller.start().unwrap();
    controller.submit_turn(Speaker::A, TURNS[0]).unwrap();
    controller.submit_turn(Speaker::B, TURNS[1]).unwrap();

    let before_events = controller.events().len();
    let err = controller.submit_turn(Speaker::B, TURNS[3]).unwrap_err();
    assert_eq!(
        err,
        DebateError::TurnOrderViolation {
            round: 3,
            expected: Speaker::A,
            actual: Speaker::B,
        }
    );

    assert_eq!(controller.memory().len(), 2);
    assert_eq!(controller.state().rounds_completed, 2);
    assert_eq!(controller.state().current_round, 3);
    assert_eq!(controller.round_rejections(), 0);
    assert_eq!(controller.events().len(), before_events + 1);
    assert_eq!(
        controller.events().last().map(|e| e.event_type),
        Some(DebateEventKind::TurnOrderViolation)
    );

    // The round is still open for the right speaker.
    assert_eq!(
        controller.submit_turn(Speaker::A, TURNS[2]).unwrap(),
        NextAction::AwaitTurn {
            round: 4,
            speaker: Speaker::B
        }
    );
}

// ── Validation and retries ─────────────────────────────────────────

#[test]
fn test_self_repetition_aborts_after_retries() {
    // A has nothing new to say in round 3.
    let mut provider = ScriptedProvider::new()
        .push(Speaker::A, TURNS[0])
        .push(Speaker::B, TURNS[1]);
    let mut controller = open(SessionConfig::default());

    let err = controller.run(&mut provider).unwrap_err();
    match err {
        DebateError::RetriesExhausted {
            round,
            attempts,
            last,
        } => {
            assert_eq!(round, 3);
            assert_eq!(attempts, 3);
            assert!(matches!(
                last,
                TurnRejection::RepetitionDetected { round: 1, similarity, .. } if similarity == 1.0
            ));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(controller.state().status, DebateStatus::Aborted);
    assert_eq!(controller.state().rounds_completed, 2);
    assert_eq!(controller.memory().len(), 2);
    assert!(controller.verdict().is_none());
    assert_eq!(provider.calls(), 5);

    let rejected = controller
        .events()
        .iter()
        .filter(|e| e.event_type == DebateEventKind::TurnRejected)
        .count();
    assert_eq!(rejected, 3);
}

#[test]
fn test_copying_opponent_is_accepted() {
    let mut controller = open(SessionConfig::default());
    controller.start().unwrap();
    controller.submit_turn(Speaker::A, TURNS[0]).unwrap();
    assert!(controller.submit_turn(Speaker::B, TURNS[0]).is_ok());
}

#[test]
fn test_verbatim_topic_passes_and_drift_rejected() {
    let mut controller = open(SessionConfig::default());
    controller.start().unwrap();
    let err = controller
        .submit_turn(Speaker::A, "Cooking pasta requires salted boiling water.")
        .unwrap_err();
    match err {
        DebateError::Rejected(TurnRejection::TopicDriftDetected { coherence, .. }) => {
            assert_eq!(coherence, 0.0)
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(controller.submit_turn(Speaker::A, TOPIC).is_ok());
}

#[test]
fn test_stopword_only_topic_still_rejects_drift() {
    let mut controller = TurnController::open(
        "Should we do this or not?",
        SpeakerBindings::default(),
        SessionConfig::default(),
    )
    .unwrap();
    controller.start().unwrap();

    let err = controller
        .submit_turn(Speaker::A, "Cooking pasta requires salted boiling water.")
        .unwrap_err();
    assert!(matches!(
        err,
        DebateError::Rejected(TurnRejection::TopicDriftDetected { .. })
    ));
    assert!(controller.memory().is_empty());

    let next = controller
        .submit_turn(Speaker::A, "We should do this, or else we will not move forward.")
        .unwrap();
    assert_eq!(
        next,
        NextAction::AwaitTurn {
            round: 2,
            speaker: Speaker::B
        }
    );
}

#[test]
fn test_shared_stems_without_shared_words_rejected() {
    let mut controller = TurnController::open(
        "Should governments regulate international commerce?",
        SpeakerBindings::default(),
        SessionConfig::default(),
    )
    .unwrap();
    controller.start().unwrap();

    let err = controller
        .submit_turn(
            Speaker::A,
            "Governing bodies regularly internationalize commercial disputes.",
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DebateError::Rejected(TurnRejection::TopicDriftDetected { .. })
    ));
    assert_eq!(controller.round_rejections(), 1);

    // One exact shared word lets the related forms count.
    assert!(controller
        .submit_turn(
            Speaker::A,
            "Governments regularly internationalize commercial disputes.",
        )
        .is_ok());
}

#[test]
fn test_retry_budget_is_per_round() {
    let mut controller = open(SessionConfig::default());
    controller.start().unwrap();
    for _ in 0..2 {
        assert!(controller.submit_turn(Speaker::A, "").is_err());
    }
    controller.submit_turn(Speaker::A, TURNS[0]).unwrap();
    for _ in 0..2 {
        assert!(controller.submit_turn(Speaker::B, "").is_err());
    }
    controller.submit_turn(Speaker::B, TURNS[1]).unwrap();
    assert_eq!(controller.state().status, DebateStatus::InProgress);
}

// ── Configuration and sinks ────────────────────────────────────────

#[test]
fn test_session_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "total_rounds = 2").unwrap();
    writeln!(file, "max_retries = 1").unwrap();
    let config = SessionConfig::load(file.path()).unwrap();

    let mut controller = open(config);
    controller
        .run(&mut ScriptedProvider::from_rounds(&TURNS[..2]))
        .unwrap();
    assert_eq!(controller.memory().len(), 2);
    assert_eq!(controller.state().total_rounds, 2);
}

#[test]
fn test_jsonl_events_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let writer = file.reopen().unwrap();
    let config = SessionConfig {
        total_rounds: 2,
        ..Default::default()
    };
    let mut controller = open(config).with_sink(Box::new(JsonlSink::new(writer)));
    controller
        .run(&mut ScriptedProvider::from_rounds(&TURNS[..2]))
        .unwrap();

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let kinds: Vec<String> = contents
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event_type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "STATE_TRANSITION",
            "TURN_ACCEPTED",
            "TURN_ACCEPTED",
            "STATE_TRANSITION",
            "VERDICT",
            "STATE_TRANSITION",
        ]
    );
}

#[test]
fn test_outcome_serializes_to_json() {
    let mut controller = open(SessionConfig::default());
    controller
        .run(&mut ScriptedProvider::from_rounds(&TURNS))
        .unwrap();
    let outcome = controller.outcome().unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "complete");
    assert_eq!(json["rounds_completed"], 8);
    assert_eq!(json["transcript"].as_array().unwrap().len(), 8);
    assert!(json["verdict"]["scores"]["A"].is_number());
    assert!(outcome.summary_line().starts_with("[COMPLETE] 8/8 rounds"));
}

#[test]
fn test_judge_is_deterministic_across_sessions() {
    let mut first = open(SessionConfig::default());
    let mut second = open(SessionConfig::default());
    let v1 = first
        .run(&mut ScriptedProvider::from_rounds(&TURNS))
        .unwrap()
        .clone();
    let v2 = second
        .run(&mut ScriptedProvider::from_rounds(&TURNS))
        .unwrap()
        .clone();

    assert_eq!(v1.winner, v2.winner);
    assert_eq!(v1.scores, v2.scores);
    assert_eq!(v1.breakdown, v2.breakdown);
    assert_eq!(v1.rationale, v2.rationale);
}
