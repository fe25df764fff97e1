//! UI module for the drill TUI

pub mod render;
pub mod theme;
pub mod widgets;

pub use render::Overlay;
