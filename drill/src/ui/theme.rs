//! Color theme and styling for the drill TUI

use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct DrillTheme {
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Transcript colors
    pub user_text: Color,
    pub assistant_text: Color,
    pub system_text: Color,

    // Scenario panel colors
    pub option_number: Color,
    pub notes_text: Color,

    // Score colors
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,
}

impl Default for DrillTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            user_text: Color::Cyan,
            assistant_text: Color::White,
            system_text: Color::DarkGray,

            option_number: Color::LightBlue,
            notes_text: Color::Yellow,

            score_high: Color::Green,
            score_mid: Color::Yellow,
            score_low: Color::Red,
        }
    }
}

impl DrillTheme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    /// Style for the trainee's own lines
    pub fn user_style(&self) -> Style {
        Style::default()
            .fg(self.user_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for oracle answers
    pub fn assistant_style(&self) -> Style {
        Style::default().fg(self.assistant_text)
    }

    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn option_style(&self) -> Style {
        Style::default()
            .fg(self.option_number)
            .add_modifier(Modifier::BOLD)
    }

    pub fn notes_style(&self) -> Style {
        Style::default().fg(self.notes_text)
    }

    /// Color for an awarded score on the 1-3 scale.
    pub fn score_color(&self, score: i64) -> Color {
        match score {
            s if s >= 3 => self.score_high,
            2 => self.score_mid,
            _ => self.score_low,
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self, focused: bool) -> Style {
        let style = Style::default().fg(if focused {
            self.border_focused
        } else {
            self.foreground
        });

        if focused {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_color_bands() {
        let theme = DrillTheme::default();
        assert_eq!(theme.score_color(3), Color::Green);
        assert_eq!(theme.score_color(7), Color::Green);
        assert_eq!(theme.score_color(2), Color::Yellow);
        assert_eq!(theme.score_color(1), Color::Red);
        assert_eq!(theme.score_color(0), Color::Red);
    }
}
