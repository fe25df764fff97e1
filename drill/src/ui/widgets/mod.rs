//! TUI widgets for the drill front end

pub mod history;
pub mod input;
pub mod scenario_panel;
pub mod status_bar;
pub mod transcript;

pub use history::HistoryWidget;
pub use input::InputWidget;
pub use scenario_panel::ScenarioPanelWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
pub use transcript::TranscriptWidget;
