//! Best-effort extraction of a scenario from free-form model output.
//!
//! The completion is expected to look like:
//!
//! ```text
//! Scenario 3: Title
//! Description: ...
//!
//! Options:
//! 1. Do A (Compliance Score: 1)
//! 2. Do B (Compliance Score: 3)
//!
//! Expert Notes: ...
//! ```
//!
//! Nothing about the model's output is guaranteed, so parsing never fails.
//! The worst case is the whole text as the body, no options, and the
//! profile's default notes.

use crate::profile::{ConfigError, ScenarioProfile, OPTIONS_MARKER};
use crate::state::ResponseOption;
use regex::Regex;

/// The three sections of a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScenario {
    pub body: String,
    pub options: Vec<ResponseOption>,
    pub notes: String,
}

/// Splits completions into body, options and notes for one profile.
#[derive(Debug, Clone)]
pub struct ScenarioParser {
    notes_marker: String,
    default_notes: String,
    option_pattern: Regex,
}

impl ScenarioParser {
    /// Build a parser for the profile's notes and score labels.
    pub fn new(profile: &ScenarioProfile) -> Result<Self, ConfigError> {
        let pattern = format!(
            r"(?s)\d+\.\s+(.*?)\s+\({}:\s+(\d+)\)",
            regex::escape(&profile.score_label)
        );
        let option_pattern = Regex::new(&pattern)
            .map_err(|e| ConfigError::InvalidProfile(format!("score_label: {e}")))?;

        Ok(Self {
            notes_marker: profile.notes_marker(),
            default_notes: profile.default_notes.clone(),
            option_pattern,
        })
    }

    /// Parse a raw completion.
    pub fn parse(&self, raw: &str) -> ParsedScenario {
        let mut parts = raw.splitn(2, OPTIONS_MARKER);
        let body = parts.next().unwrap_or_default().trim().to_string();

        let Some(rest) = parts.next() else {
            tracing::warn!(
                len = raw.len(),
                "completion has no '{OPTIONS_MARKER}' section; template and parser may have drifted"
            );
            return ParsedScenario {
                body,
                options: Vec::new(),
                notes: self.default_notes.clone(),
            };
        };

        let mut sections = rest.splitn(2, self.notes_marker.as_str());
        let options_text = sections.next().unwrap_or_default().trim();
        let options = self.extract_options(options_text);

        if options.is_empty() {
            tracing::warn!(
                section_len = options_text.len(),
                "no options matched in completion; template and parser may have drifted"
            );
        }

        let notes = match sections.next() {
            Some(notes) => notes.trim().to_string(),
            None => {
                tracing::debug!(marker = %self.notes_marker, "completion has no notes section");
                self.default_notes.clone()
            }
        };

        ParsedScenario {
            body,
            options,
            notes,
        }
    }

    fn extract_options(&self, text: &str) -> Vec<ResponseOption> {
        self.option_pattern
            .captures_iter(text)
            .map(|caps| ResponseOption::new(caps[1].trim(), &caps[2]))
            .collect()
    }
}
