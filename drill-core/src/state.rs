//! Session state: the current scenario, score, counter and logs.
//!
//! A [`SessionState`] belongs to exactly one session. The engine is the
//! only writer; front ends read it through the engine or a snapshot.

use serde::{Deserialize, Serialize};
use std::num::ParseIntError;

/// One selectable response to a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    /// What the responder would do.
    pub description: String,
    /// Score digits exactly as they appeared in the completion.
    pub raw_score: String,
}

impl ResponseOption {
    pub fn new(description: impl Into<String>, raw_score: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            raw_score: raw_score.into(),
        }
    }

    /// The score as an integer.
    pub fn score(&self) -> Result<i64, ParseIntError> {
        self.raw_score.trim().parse()
    }
}

/// One generated case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub sequence_number: u32,
    pub body: String,
    pub options: Vec<ResponseOption>,
    pub notes: String,
}

impl Scenario {
    /// Short title for headers.
    ///
    /// Completions start with `Scenario N: Title`, so this is the text
    /// between the first and second colon of the body. Falls back to the
    /// first line when the body has no colon.
    pub fn title(&self) -> &str {
        let mut segments = self.body.split(':');
        let first = segments.next().unwrap_or_default();
        match segments.next() {
            Some(second) => second.lines().next().unwrap_or_default().trim(),
            None => first.lines().next().unwrap_or_default().trim(),
        }
    }
}

/// The option a user picked and the score it earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub description: String,
    pub awarded_score: i64,
}

/// A generated scenario plus the choice made on it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub scenario: Scenario,
    pub selection: Option<Selection>,
}

impl HistoryEntry {
    pub fn is_answered(&self) -> bool {
        self.selection.is_some()
    }
}

/// Who said a conversation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the conversational transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Mutable record of one training session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub(crate) running_score: i64,
    pub(crate) sequence_counter: u32,
    pub(crate) current: Option<Scenario>,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) conversation: Vec<ConversationTurn>,
}

impl SessionState {
    /// A fresh session: score 0, counter 1, nothing generated.
    pub fn new() -> Self {
        Self {
            running_score: 0,
            sequence_counter: 1,
            current: None,
            history: Vec::new(),
            conversation: Vec::new(),
        }
    }

    pub fn running_score(&self) -> i64 {
        self.running_score
    }

    pub fn sequence_counter(&self) -> u32 {
        self.sequence_counter
    }

    pub fn current(&self) -> Option<&Scenario> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    /// Install a freshly generated scenario and log it.
    pub(crate) fn push_scenario(&mut self, scenario: Scenario) -> &Scenario {
        self.history.push(HistoryEntry {
            scenario: scenario.clone(),
            selection: None,
        });
        self.current.insert(scenario)
    }

    /// Apply an already-validated selection.
    ///
    /// Callers must have checked that a history entry exists and computed
    /// the new score and counter without overflow.
    pub(crate) fn record_selection(
        &mut self,
        selection: Selection,
        running_score: i64,
        sequence_counter: u32,
        score_label: &str,
    ) {
        self.running_score = running_score;
        self.sequence_counter = sequence_counter;
        self.conversation
            .push(ConversationTurn::user(format!("Selected: {}", selection.description)));
        self.conversation.push(ConversationTurn::assistant(format!(
            "Option selected. {score_label}: {}",
            selection.awarded_score
        )));
        if let Some(last) = self.history.last_mut() {
            last.selection = Some(selection);
        }
    }

    pub(crate) fn push_exchange(&mut self, question: &str, answer: &str) {
        self.conversation.push(ConversationTurn::user(question));
        self.conversation.push(ConversationTurn::assistant(answer));
    }

    /// Reset counter, current scenario and both logs. Score is kept.
    pub(crate) fn clear(&mut self) {
        self.sequence_counter = 1;
        self.current = None;
        self.history.clear();
        self.conversation.clear();
    }

    pub(crate) fn reset_score(&mut self) {
        self.running_score = 0;
    }

    /// Sum of awarded scores in the history. Equals `running_score` until
    /// `reset_score` or `clear` breaks the link.
    pub fn history_score(&self) -> i64 {
        self.history
            .iter()
            .filter_map(|e| e.selection.as_ref())
            .fold(0i64, |total, s| total.saturating_add(s.awarded_score))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
