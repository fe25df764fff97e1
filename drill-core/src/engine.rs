//! ScenarioEngine - the primary public API for a training session.
//!
//! The engine owns one session's state and drives it through four
//! operations: `generate`, `choose`, `clear` and `reset_score`, plus `ask`
//! for free-form questions. Oracle calls are the only fallible I/O; when
//! one fails the session is left exactly as it was.

use crate::chat::ChatAdapter;
use crate::oracle::{complete_within, OracleError, TextOracle};
use crate::parser::ScenarioParser;
use crate::profile::{ConfigError, ScenarioProfile};
use crate::state::{ConversationTurn, HistoryEntry, Scenario, Selection, SessionState};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default bound on a single oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Why a `choose` call was rejected. Nothing is mutated when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no scenario is active")]
    NoActiveScenario,

    #[error("option {index} is out of range ({len} options)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("option score '{raw}' is not a number")]
    NonNumericScore { raw: String },

    #[error("history has no entry for the active scenario")]
    NoHistoryEntry,

    #[error("awarding {awarded} would overflow the running score")]
    ScoreOverflow { awarded: i64 },

    #[error("sequence counter is exhausted")]
    CounterOverflow,
}

/// Errors from engine operations. None of them are fatal to the session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("Session is busy waiting on the oracle")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the user should be offered a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Oracle(e) => e.is_retryable(),
            EngineError::Busy => true,
            _ => false,
        }
    }
}

/// Where the session is in its generate/choose cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Nothing generated since start or the last clear.
    Idle,
    /// A `generate` call is in flight.
    AwaitingGeneration,
    /// A scenario is current and can be answered.
    Active,
}

/// Drives one training session against a [`TextOracle`].
pub struct ScenarioEngine<O> {
    oracle: O,
    profile: ScenarioProfile,
    parser: ScenarioParser,
    state: SessionState,
    oracle_timeout: Duration,
}

impl<O: TextOracle> ScenarioEngine<O> {
    /// Create an engine with an empty session.
    pub fn new(oracle: O, profile: ScenarioProfile) -> Result<Self, ConfigError> {
        profile.validate()?;
        let parser = ScenarioParser::new(&profile)?;
        Ok(Self {
            oracle,
            profile,
            parser,
            state: SessionState::new(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        })
    }

    /// Bound every oracle call by `timeout`.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Ask the oracle for a new scenario and make it current.
    ///
    /// The scenario is numbered with the current sequence counter, which
    /// is not advanced here; `choose` advances it.
    pub async fn generate(&mut self) -> Result<&Scenario, EngineError> {
        let sequence_number = self.state.sequence_counter;
        let prompt = self.profile.render_prompt(sequence_number);
        tracing::debug!(sequence_number, prompt_len = prompt.len(), "requesting scenario");

        let raw = complete_within(&self.oracle, &prompt, self.oracle_timeout)
            .await
            .inspect_err(|e| {
                tracing::warn!(sequence_number, error = %e, "scenario generation failed")
            })?;

        let parsed = self.parser.parse(&raw);
        tracing::info!(
            sequence_number,
            options = parsed.options.len(),
            profile = %self.profile.name,
            "generated scenario"
        );

        Ok(self.state.push_scenario(Scenario {
            sequence_number,
            body: parsed.body,
            options: parsed.options,
            notes: parsed.notes,
        }))
    }

    /// Pick option `index` (zero-based) of the current scenario.
    ///
    /// All checks run before anything is written: either the score, the
    /// counter, the transcript and the history entry all change, or none
    /// of them do. The scenario stays current afterwards and may be chosen
    /// again; each choice adds its score.
    pub fn choose(&mut self, index: usize) -> Result<Selection, EngineError> {
        let current = self
            .state
            .current
            .as_ref()
            .ok_or(SelectionError::NoActiveScenario)?;
        let option = current
            .options
            .get(index)
            .ok_or(SelectionError::IndexOutOfRange {
                index,
                len: current.options.len(),
            })?;
        let awarded_score = option
            .score()
            .map_err(|_| SelectionError::NonNumericScore {
                raw: option.raw_score.clone(),
            })?;
        if self.state.history.is_empty() {
            return Err(SelectionError::NoHistoryEntry.into());
        }
        let running_score = self
            .state
            .running_score
            .checked_add(awarded_score)
            .ok_or(SelectionError::ScoreOverflow {
                awarded: awarded_score,
            })?;
        let sequence_counter = self
            .state
            .sequence_counter
            .checked_add(1)
            .ok_or(SelectionError::CounterOverflow)?;

        let selection = Selection {
            description: option.description.clone(),
            awarded_score,
        };
        self.state.record_selection(
            selection.clone(),
            running_score,
            sequence_counter,
            &self.profile.score_label,
        );

        tracing::info!(
            index,
            awarded_score,
            running_score = self.state.running_score,
            sequence_counter = self.state.sequence_counter,
            "option chosen"
        );
        Ok(selection)
    }

    /// Forget all scenarios and the transcript. The score is kept.
    pub fn clear(&mut self) {
        self.state.clear();
        tracing::info!(running_score = self.state.running_score, "history cleared");
    }

    /// Zero the running score. History is kept.
    pub fn reset_score(&mut self) {
        self.state.reset_score();
        tracing::info!("score reset");
    }

    /// Ask a free-form question about the current scenario.
    pub async fn ask(&mut self, question: &str) -> Result<String, EngineError> {
        let chat = ChatAdapter::new(&self.oracle, &self.profile, self.oracle_timeout);
        let answer = chat
            .ask(&mut self.state, question)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "chat question failed"))?;
        Ok(answer)
    }

    /// Write the session as pretty JSON.
    pub async fn export_transcript(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        write_transcript(&self.state, path.as_ref()).await
    }

    pub fn phase(&self) -> EnginePhase {
        if self.state.current.is_some() {
            EnginePhase::Active
        } else {
            EnginePhase::Idle
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> &ScenarioProfile {
        &self.profile
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn current(&self) -> Option<&Scenario> {
        self.state.current()
    }

    pub fn running_score(&self) -> i64 {
        self.state.running_score()
    }

    pub fn sequence_counter(&self) -> u32 {
        self.state.sequence_counter()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.state.history()
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        self.state.conversation()
    }
}

pub(crate) async fn write_transcript(
    state: &SessionState,
    path: &Path,
) -> Result<(), EngineError> {
    let content = serde_json::to_string_pretty(state)?;
    tokio::fs::write(path, content).await?;
    tracing::info!(path = %path.display(), "transcript exported");
    Ok(())
}
