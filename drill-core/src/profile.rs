//! Scenario profiles - the vocabulary and prompt template of one trainer.
//!
//! The HIPAA trainer and the incident-response simulation run the same
//! engine; everything that differs between them lives in a
//! [`ScenarioProfile`]. The prompt template and the parser are coupled:
//! the template tells the model to emit `Options:` and `<notes label>:`
//! sections, and the parser splits on exactly those markers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Placeholder substituted with the current sequence number.
pub const SEQUENCE_PLACEHOLDER: &str = "{sequence_number}";

/// Marker that introduces the numbered option list.
pub const OPTIONS_MARKER: &str = "Options:";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API key configured - set ANTHROPIC_API_KEY environment variable")]
    MissingCredential,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Unknown built-in profile '{0}' (expected 'hipaa' or 'incident')")]
    UnknownProfile(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Profile parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Vocabulary and prompt template for one kind of exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    /// Short identifier, e.g. `hipaa`.
    pub name: String,

    /// Display title for front ends.
    #[serde(default)]
    pub title: String,

    /// What one generated case is called ("Scenario", "Inject").
    #[serde(default = "default_scenario_noun")]
    pub scenario_noun: String,

    /// Who writes the notes ("expert", "facilitator").
    pub role_noun: String,

    /// Section label the notes follow, without the colon.
    pub notes_label: String,

    /// Label inside each option's score parenthetical, without the colon.
    pub score_label: String,

    /// Label placed before a free-form chat question.
    #[serde(default = "default_question_label")]
    pub question_label: String,

    /// Prompt sent to the oracle; must contain `{sequence_number}` exactly once.
    pub prompt_template: String,

    /// Notes text used when the completion has no notes section.
    #[serde(default)]
    pub default_notes: String,
}

fn default_scenario_noun() -> String {
    "Scenario".to_string()
}

fn default_question_label() -> String {
    "Question".to_string()
}

const HIPAA_PROMPT: &str = "
Generate a detailed HIPAA compliance scenario for a healthcare provider. The scenario should involve potential privacy or security issues related to protected health information (PHI). Provide 3 response options with detailed explanations of their compliance implications.

Format:
Scenario {sequence_number}: [Title]
Description: [Detailed description of the HIPAA-related scenario, including potential risks and compliance concerns]

Options:
1. [Detailed description of option 1] (Compliance Score: [1-3])
2. [Detailed description of option 2] (Compliance Score: [1-3])
3. [Detailed description of option 3] (Compliance Score: [1-3])

Expert Notes: [Detailed notes on options, HIPAA implications, and best practices]
";

const INCIDENT_PROMPT: &str = "
Generate a detailed cyber incident inject for a chain of 2500 convenience stores with gas stations. The incident should affect critical infrastructure like fuel logistics, POS systems, or customer data. Provide 3 response options with detailed explanations.

Format:
Inject {sequence_number}: [Title]
Time: [Time] ([Day])
Incident: [Detailed description of the incident, including potential impacts and immediate concerns]

Options:
1. [Detailed description of option 1] (Score: [1-3])
2. [Detailed description of option 2] (Score: [1-3])
3. [Detailed description of option 3] (Score: [1-3])

Facilitator Notes: [Detailed notes on options, consequences, and factors to consider]
";

impl ScenarioProfile {
    /// The HIPAA compliance trainer.
    pub fn hipaa() -> Self {
        Self {
            name: "hipaa".to_string(),
            title: "HIPAA Compliance Assistant".to_string(),
            scenario_noun: "Scenario".to_string(),
            role_noun: "expert".to_string(),
            notes_label: "Expert Notes".to_string(),
            score_label: "Compliance Score".to_string(),
            question_label: "HIPAA Question".to_string(),
            prompt_template: HIPAA_PROMPT.to_string(),
            default_notes: "No expert notes available".to_string(),
        }
    }

    /// The cyber incident-response simulation.
    pub fn incident() -> Self {
        Self {
            name: "incident".to_string(),
            title: "Cyber Incident Response Simulation Engine".to_string(),
            scenario_noun: "Inject".to_string(),
            role_noun: "facilitator".to_string(),
            notes_label: "Facilitator Notes".to_string(),
            score_label: "Score".to_string(),
            question_label: "Question".to_string(),
            prompt_template: INCIDENT_PROMPT.to_string(),
            default_notes: "No facilitator notes available".to_string(),
        }
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "hipaa" => Ok(Self::hipaa()),
            "incident" | "cyber" => Ok(Self::incident()),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }

    /// Parse a profile from TOML, filling defaults and validating it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut profile: Self = toml::from_str(content)?;
        if profile.default_notes.trim().is_empty() {
            profile.default_notes = format!("No {} notes available", profile.role_noun);
        }
        if profile.title.trim().is_empty() {
            profile.title = profile.name.clone();
        }
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that the template and the parser markers agree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notes_label.trim().is_empty() {
            return Err(ConfigError::InvalidProfile("notes_label is empty".into()));
        }
        if self.score_label.trim().is_empty() {
            return Err(ConfigError::InvalidProfile("score_label is empty".into()));
        }
        let placeholders = self.prompt_template.matches(SEQUENCE_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(ConfigError::InvalidProfile(format!(
                "prompt_template must contain {SEQUENCE_PLACEHOLDER} exactly once, found {placeholders}"
            )));
        }
        if !self.prompt_template.contains(OPTIONS_MARKER) {
            return Err(ConfigError::InvalidProfile(format!(
                "prompt_template must ask for an '{OPTIONS_MARKER}' section"
            )));
        }
        let notes_marker = self.notes_marker();
        if !self.prompt_template.contains(&notes_marker) {
            return Err(ConfigError::InvalidProfile(format!(
                "prompt_template must ask for a '{notes_marker}' section"
            )));
        }
        Ok(())
    }

    /// The notes section marker, including the trailing colon.
    pub fn notes_marker(&self) -> String {
        format!("{}:", self.notes_label)
    }

    /// Build the generation prompt for a sequence number.
    pub fn render_prompt(&self, sequence_number: u32) -> String {
        self.prompt_template
            .replace(SEQUENCE_PLACEHOLDER, &sequence_number.to_string())
    }
}

impl Default for ScenarioProfile {
    fn default() -> Self {
        Self::hipaa()
    }
}
