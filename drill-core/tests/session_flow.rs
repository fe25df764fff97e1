//! Session-level behavior driven through the scripted test harness.
//!
//! Run with: `cargo test -p drill-core --test session_flow`

use drill_core::testing::{
    assert_counter, assert_history_len, assert_score, format_completion, TestHarness,
};
use drill_core::{EngineError, EnginePhase, ScenarioProfile, SelectionError, Speaker};

// =============================================================================
// END-TO-END
// =============================================================================

#[tokio::test]
async fn test_hipaa_end_to_end_example() {
    let mut harness = TestHarness::hipaa();
    harness.expect_completion(
        "Scenario 1: Title\nDescription: X\n\nOptions:\n1. Do A (Compliance Score: 1)\n2. Do B (Compliance Score: 3)\n\nExpert Notes: Prefer B",
    );

    let scenario = harness.generate().await.unwrap();
    assert!(scenario.body.starts_with("Scenario 1: Title"));
    let options: Vec<(&str, &str)> = scenario
        .options
        .iter()
        .map(|o| (o.description.as_str(), o.raw_score.as_str()))
        .collect();
    assert_eq!(options, vec![("Do A", "1"), ("Do B", "3")]);
    assert_eq!(scenario.notes, "Prefer B");

    let before = harness.score();
    let selection = harness.choose(1).unwrap();
    assert_eq!(selection.description, "Do B");
    assert_score(&harness, before + 3);
    assert_counter(&harness, 2);

    let conversation = harness.engine.conversation();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[0].speaker, Speaker::User);
    assert_eq!(conversation[0].text, "Selected: Do B");
    assert_eq!(conversation[1].speaker, Speaker::Assistant);
    assert_eq!(conversation[1].text, "Option selected. Compliance Score: 3");
}

#[tokio::test]
async fn test_incident_vocabulary() {
    let mut harness = TestHarness::incident();
    harness.expect_completion(
        "Inject 1: POS outage\nTime: 09:00 (Monday)\nIncident: Registers are down.\n\nOptions:\n1. Switch to offline mode (Score: 2)\n\nFacilitator Notes: Offline mode limits exposure.",
    );

    let scenario = harness.generate().await.unwrap();
    assert_eq!(scenario.title(), "POS outage");
    assert_eq!(scenario.notes, "Offline mode limits exposure.");

    harness.choose(0).unwrap();
    assert_eq!(
        harness.engine.conversation()[1].text,
        "Option selected. Score: 2"
    );
}

// =============================================================================
// SCORE AND COUNTER
// =============================================================================

#[tokio::test]
async fn test_score_accumulates_over_rounds() {
    let mut harness = TestHarness::hipaa();
    let scores = [3, 1, 2, 3, 2];

    for (round, score) in scores.iter().enumerate() {
        harness.expect_scenario(&format!("Case {}", round + 1), &[("Only choice", *score)]);
        harness.play(0).await.unwrap();
    }

    assert_score(&harness, scores.iter().sum());
    assert_history_len(&harness, scores.len());
    for (entry, score) in harness.engine.history().iter().zip(scores) {
        let selection = entry.selection.as_ref().unwrap();
        assert_eq!(selection.description, "Only choice");
        assert_eq!(selection.awarded_score, score);
    }
    assert_eq!(harness.engine.state().history_score(), harness.score());
}

#[tokio::test]
async fn test_counter_follows_choices_not_generations() {
    let mut harness = TestHarness::hipaa();
    assert_counter(&harness, 1);

    harness.expect_scenario("One", &[("A", 1)]);
    harness.generate().await.unwrap();
    assert_counter(&harness, 1);

    // A second generation without a choice reuses the same number.
    harness.expect_scenario("One again", &[("A", 1)]);
    let scenario = harness.generate().await.unwrap();
    assert_eq!(scenario.sequence_number, 1);
    assert_history_len(&harness, 2);

    for k in 1..=4 {
        harness.choose(0).unwrap();
        assert_counter(&harness, 1 + k);
    }

    harness.engine.clear();
    assert_counter(&harness, 1);
}

#[tokio::test]
async fn test_reset_score_is_idempotent_and_local() {
    let mut harness = TestHarness::incident();
    harness.expect_scenario("One", &[("A", 3)]);
    harness.play(0).await.unwrap();
    let history = harness.engine.history().to_vec();
    let counter = harness.counter();

    harness.engine.reset_score();
    assert_score(&harness, 0);
    harness.engine.reset_score();
    assert_score(&harness, 0);

    assert_eq!(harness.engine.history(), history.as_slice());
    assert_counter(&harness, counter);
}

#[tokio::test]
async fn test_clear_keeps_score() {
    let mut harness = TestHarness::hipaa();
    harness.expect_scenario("One", &[("A", 2)]);
    harness.play(0).await.unwrap();
    harness.ask("Why?").await.unwrap();

    harness.engine.clear();

    assert_score(&harness, 2);
    assert_history_len(&harness, 0);
    assert!(harness.engine.conversation().is_empty());
    assert!(harness.engine.current().is_none());
    assert_eq!(harness.engine.phase(), EnginePhase::Idle);
}

// =============================================================================
// INVALID INPUT
// =============================================================================

#[tokio::test]
async fn test_out_of_range_choice_changes_nothing() {
    let mut harness = TestHarness::hipaa();
    harness.expect_scenario("One", &[("A", 1), ("B", 2)]);
    harness.generate().await.unwrap();
    let before = harness.engine.state().clone();

    for index in [2, 3, usize::MAX] {
        let err = harness.choose(index).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidSelection(SelectionError::IndexOutOfRange { .. })
        ));
    }

    assert_eq!(harness.engine.state(), &before);
}

#[tokio::test]
async fn test_malformed_completion_degrades() {
    let mut harness = TestHarness::hipaa();
    harness.expect_completion("I'm sorry, I can't produce that scenario.");

    let scenario = harness.generate().await.unwrap();

    assert_eq!(scenario.body, "I'm sorry, I can't produce that scenario.");
    assert!(scenario.options.is_empty());
    assert_eq!(scenario.notes, "No expert notes available");
    assert_history_len(&harness, 1);
    assert!(matches!(
        harness.choose(0),
        Err(EngineError::InvalidSelection(SelectionError::IndexOutOfRange { index: 0, len: 0 }))
    ));
}

#[tokio::test]
async fn test_failed_generation_can_be_retried() {
    let mut harness = TestHarness::incident();
    harness.expect_failure("503 Service Unavailable");
    harness.expect_scenario("Retry worked", &[("A", 2)]);

    let err = harness.generate().await.unwrap_err();
    assert!(err.is_retryable());
    assert_history_len(&harness, 0);
    assert_eq!(harness.engine.phase(), EnginePhase::Idle);

    let scenario = harness.generate().await.unwrap();
    assert_eq!(scenario.title(), "Retry worked");
    assert_history_len(&harness, 1);
}

// =============================================================================
// CHAT
// =============================================================================

#[tokio::test]
async fn test_chat_uses_current_scenario_as_context() {
    let mut harness = TestHarness::hipaa();
    harness.expect_scenario("Lost badge", &[("Disable badge", 3)]);
    harness.generate().await.unwrap();
    harness.expect_completion("Disable it right away.");

    let answer = harness.ask("What first?").await.unwrap();

    assert_eq!(answer, "Disable it right away.");
    let prompt = harness.last_prompt().unwrap();
    assert!(prompt.starts_with("Context: Scenario: Scenario 1: Lost badge"));
    assert!(prompt.contains("Options: [(\"Disable badge\", \"3\")]"));
    assert!(prompt.ends_with("\nHIPAA Question: What first?"));
    assert_score(&harness, 0);
    assert_history_len(&harness, 1);
}

#[tokio::test]
async fn test_empty_question_is_still_logged() {
    let mut harness = TestHarness::incident();
    harness.expect_completion("Could you clarify?");

    harness.ask("").await.unwrap();

    let conversation = harness.engine.conversation();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[0].text, "");
    assert_eq!(conversation[1].text, "Could you clarify?");
    assert!(harness.last_prompt().unwrap().starts_with("Context: Inject: None\nOptions: []"));
}

// =============================================================================
// CUSTOM PROFILES
// =============================================================================

#[tokio::test]
async fn test_custom_profile_round_trip() {
    let profile = ScenarioProfile::from_toml_str(
        r#"
name = "phishing"
scenario_noun = "Drill"
role_noun = "coach"
notes_label = "Coach Notes"
score_label = "Awareness"
prompt_template = "Drill {sequence_number}\nOptions:\n1. ... (Awareness: [1-3])\nCoach Notes: ..."
"#,
    )
    .unwrap();

    let mut harness = TestHarness::new(profile.clone());
    harness.expect_completion(format_completion(
        &profile,
        1,
        "Fake invoice",
        &[("Report to security", 3), ("Click the link", 1)],
        "Always report.",
    ));

    let scenario = harness.generate().await.unwrap();
    assert_eq!(scenario.options.len(), 2);
    assert_eq!(scenario.notes, "Always report.");
    assert_eq!(harness.last_prompt().unwrap(), "Drill 1\nOptions:\n1. ... (Awareness: [1-3])\nCoach Notes: ...");

    harness.choose(0).unwrap();
    assert_eq!(
        harness.engine.conversation()[1].text,
        "Option selected. Awareness: 3"
    );
}
