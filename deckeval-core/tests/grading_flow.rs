//! End-to-end grading flow through the public API
//!
//! These tests exercise the crate the way the harness does: pure
//! extract/score calls plus the start → respond → finalize lifecycle,
//! including the reasoning-block handling the pure-function unit tests
//! only touch in isolation.

use deckeval_core::{
    GroundTruth, Message, ScoreConfig, SessionError, SessionRegistry, extract, score,
};

#[test]
fn extraction_contract_examples() {
    assert_eq!(extract("The answer is 1"), Some(1));
    assert_eq!(extract("Option 3 is correct"), Some(3));
    assert_eq!(extract("I choose 7"), Some(7));
    assert_eq!(extract("The answer is option 2."), Some(2));
    assert_eq!(extract("Some reasoning... therefore 5"), Some(5));
    assert_eq!(extract("No answer here"), None);
    assert_eq!(extract(""), None);
}

#[test]
fn scoring_contract_examples() {
    let config = ScoreConfig::default();
    assert!((score("The answer is 1", &GroundTruth::new(1), &config) - 1.0).abs() < f64::EPSILON);
    assert!((score("The answer is 2", &GroundTruth::new(1), &config) - 0.1).abs() < f64::EPSILON);
    assert_eq!(score("No answer", &GroundTruth::new(1), &config), 0.0);
}

#[tokio::test]
async fn reasoning_block_does_not_shadow_the_answer() {
    let registry = SessionRegistry::default();
    let id = registry.start(None, GroundTruth::new(2)).await;

    let response = "<think>Option 1 frees the 9 of clubs, but that buries \
                    the ace. Option 3 wastes a free cell.</think>\n\
                    The answer is 2";
    let outcome = registry
        .respond(&id, &[Message::assistant(response)])
        .await
        .unwrap();

    assert!((outcome.reward - 1.0).abs() < f64::EPSILON);
    assert_eq!(outcome.message, "Correct!");
    registry.finalize(&id).await;
}

#[tokio::test]
async fn lifecycle_faults_only_on_unknown_ids() {
    let registry = SessionRegistry::default();

    let id = registry.start(None, GroundTruth::new(3)).await;
    registry
        .respond(&id, &[Message::assistant("The answer is 3")])
        .await
        .unwrap();
    registry.finalize(&id).await;

    // Double-finalize after a completed flow: no-op.
    registry.finalize(&id).await;

    // Respond/finalize on a never-started id: only respond faults.
    let result = registry.respond("ghost", &[]).await;
    assert!(matches!(result, Err(SessionError::UnknownInstance(_))));
    registry.finalize("ghost").await;
}
