//! Testing utilities for training sessions.
//!
//! This module provides tools for integration testing:
//! - `MockOracle` for deterministic testing without API calls
//! - `TestHarness` for scripted sessions
//! - Assertion helpers for verifying session state

use crate::engine::{EngineError, ScenarioEngine};
use crate::oracle::{OracleError, TextOracle};
use crate::profile::ScenarioProfile;
use crate::state::{Scenario, Selection};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A scripted reply from the mock oracle.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this completion text.
    Completion(String),
    /// Fail as if the service were unreachable.
    Failure(String),
}

/// An oracle that returns scripted replies in order.
///
/// Use this for deterministic tests without API calls. Every prompt it
/// receives is recorded.
#[derive(Debug, Default)]
pub struct MockOracle {
    replies: Mutex<VecDeque<MockReply>>,
    prompts: Mutex<Vec<String>>,
    delay: Duration,
}

impl MockOracle {
    /// Create a mock oracle with scripted replies.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Create a mock oracle that only ever succeeds.
    pub fn completions<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|t| MockReply::Completion(t.into()))
                .collect(),
        )
    }

    /// Sleep this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Add a reply to the queue.
    pub fn queue(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

// A panicking test thread must not hide the mock from the rest of the test.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TextOracle for MockOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        lock(&self.prompts).push(prompt.to_string());
        let reply = lock(&self.replies).pop_front();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match reply {
            Some(MockReply::Completion(text)) => Ok(text),
            Some(MockReply::Failure(message)) => {
                Err(OracleError::Unavailable(claude::Error::Network(message)))
            }
            None => Ok("The oracle has no more scripted completions.".to_string()),
        }
    }
}

/// Format a completion the way the profile's template asks for it.
pub fn format_completion(
    profile: &ScenarioProfile,
    sequence_number: u32,
    title: &str,
    options: &[(&str, i64)],
    notes: &str,
) -> String {
    let listing: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, (description, score))| {
            format!("{}. {description} ({}: {score})", i + 1, profile.score_label)
        })
        .collect();

    format!(
        "{} {sequence_number}: {title}\nDescription: Generated for testing.\n\nOptions:\n{}\n\n{} {notes}",
        profile.scenario_noun,
        listing.join("\n"),
        profile.notes_marker()
    )
}

/// Test harness for running scripted sessions.
pub struct TestHarness {
    /// The engine under test.
    pub engine: ScenarioEngine<Arc<MockOracle>>,
    /// The oracle the engine talks to.
    pub oracle: Arc<MockOracle>,
}

impl TestHarness {
    /// Create a harness for a profile with no scripted replies.
    pub fn new(profile: ScenarioProfile) -> Self {
        let oracle = Arc::new(MockOracle::default());
        let engine = match ScenarioEngine::new(Arc::clone(&oracle), profile) {
            Ok(engine) => engine,
            Err(e) => panic!("test profile is invalid: {e}"),
        };
        Self { engine, oracle }
    }

    pub fn hipaa() -> Self {
        Self::new(ScenarioProfile::hipaa())
    }

    pub fn incident() -> Self {
        Self::new(ScenarioProfile::incident())
    }

    /// Queue a raw completion.
    pub fn expect_completion(&mut self, text: impl Into<String>) -> &mut Self {
        self.oracle.queue(MockReply::Completion(text.into()));
        self
    }

    /// Queue a well-formed scenario for the next sequence number.
    pub fn expect_scenario(&mut self, title: &str, options: &[(&str, i64)]) -> &mut Self {
        let text = format_completion(
            self.engine.profile(),
            self.engine.sequence_counter(),
            title,
            options,
            "Scripted notes.",
        );
        self.expect_completion(text)
    }

    /// Queue an oracle failure.
    pub fn expect_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.oracle.queue(MockReply::Failure(message.into()));
        self
    }

    pub async fn generate(&mut self) -> Result<Scenario, EngineError> {
        self.engine.generate().await.cloned()
    }

    pub fn choose(&mut self, index: usize) -> Result<Selection, EngineError> {
        self.engine.choose(index)
    }

    pub async fn ask(&mut self, question: &str) -> Result<String, EngineError> {
        self.engine.ask(question).await
    }

    /// Generate then immediately choose `index`.
    pub async fn play(&mut self, index: usize) -> Result<Selection, EngineError> {
        self.engine.generate().await?;
        self.engine.choose(index)
    }

    pub fn score(&self) -> i64 {
        self.engine.running_score()
    }

    pub fn counter(&self) -> u32 {
        self.engine.sequence_counter()
    }

    pub fn history_len(&self) -> usize {
        self.engine.history().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.oracle.prompts().pop()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::hipaa()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the running score.
#[track_caller]
pub fn assert_score(harness: &TestHarness, expected: i64) {
    let actual = harness.score();
    assert_eq!(actual, expected, "Expected score {expected}, got {actual}");
}

/// Assert the sequence counter.
#[track_caller]
pub fn assert_counter(harness: &TestHarness, expected: u32) {
    let actual = harness.counter();
    assert_eq!(actual, expected, "Expected counter {expected}, got {actual}");
}

/// Assert the number of history entries.
#[track_caller]
pub fn assert_history_len(harness: &TestHarness, expected: usize) {
    let actual = harness.history_len();
    assert_eq!(
        actual, expected,
        "Expected {expected} history entries, got {actual}"
    );
}
