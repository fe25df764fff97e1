//! Command-line arguments and the config built from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use drill_core::{ConfigError, OracleConfig, ScenarioProfile};

/// Scenario-response training in the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "drill", version)]
#[command(about = "Scenario-response training: HIPAA compliance trainer and incident-response simulation")]
pub struct Args {
    /// Built-in profile to run (hipaa or incident)
    #[arg(long, default_value = "hipaa")]
    pub profile: String,

    /// Load the profile from a TOML file instead of a built-in one
    #[arg(long, value_name = "PATH", conflicts_with = "profile")]
    pub profile_file: Option<PathBuf>,

    /// Claude model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum tokens per completion
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Seconds to wait for one oracle call before giving up
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Run the line-oriented text interface instead of the TUI
    #[arg(long)]
    pub headless: bool,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Resolve the profile from `--profile-file` or `--profile`.
    pub fn load_profile(&self) -> Result<ScenarioProfile, ConfigError> {
        match &self.profile_file {
            Some(path) => ScenarioProfile::load(path),
            None => ScenarioProfile::builtin(&self.profile),
        }
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn oracle_config(&self) -> OracleConfig {
        let mut config = OracleConfig::default().with_request_timeout(self.oracle_timeout());
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        config
    }
}
