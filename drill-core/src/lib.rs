//! Scenario-response training engine.
//!
//! This crate provides:
//! - A text-oracle abstraction with a Claude-backed implementation
//! - A best-effort parser that turns a completion into a scenario with
//!   scored options and notes
//! - Session state with a running score, sequence counter, history and
//!   conversation transcript
//! - Profiles for the HIPAA trainer and the incident-response simulation
//!
//! # Quick Start
//!
//! ```ignore
//! use drill_core::{ClaudeOracle, OracleConfig, ScenarioEngine, ScenarioProfile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let oracle = ClaudeOracle::from_env(OracleConfig::default())?;
//!     let mut engine = ScenarioEngine::new(oracle, ScenarioProfile::hipaa())?;
//!
//!     let scenario = engine.generate().await?;
//!     println!("{}", scenario.body);
//!
//!     let selection = engine.choose(0)?;
//!     println!("+{} (total {})", selection.awarded_score, engine.running_score());
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod engine;
pub mod oracle;
pub mod parser;
pub mod profile;
pub mod shared;
pub mod state;
pub mod testing;

// Primary public API
pub use chat::ChatAdapter;
pub use engine::{EngineError, EnginePhase, ScenarioEngine, SelectionError};
pub use oracle::{ClaudeOracle, OracleConfig, OracleError, TextOracle};
pub use parser::{ParsedScenario, ScenarioParser};
pub use profile::{ConfigError, ScenarioProfile};
pub use shared::SharedEngine;
pub use state::{
    ConversationTurn, HistoryEntry, ResponseOption, Scenario, Selection, SessionState, Speaker,
};
pub use testing::{MockOracle, MockReply, TestHarness};
