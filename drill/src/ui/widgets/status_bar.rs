//! Status line and hotkey hints

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{InputMode, View};
use crate::ui::theme::DrillTheme;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Score, counter and the latest status message.
pub struct StatusBarWidget<'a> {
    running_score: i64,
    sequence_counter: u32,
    score_label: &'a str,
    view: View,
    busy_frame: Option<u8>,
    message: Option<&'a str>,
    theme: &'a DrillTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(running_score: i64, sequence_counter: u32, theme: &'a DrillTheme) -> Self {
        Self {
            running_score,
            sequence_counter,
            score_label: "Score",
            view: View::Trainee,
            busy_frame: None,
            message: None,
            theme,
        }
    }

    pub fn score_label(mut self, label: &'a str) -> Self {
        self.score_label = label;
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    /// Show a spinner driven by the animation frame.
    pub fn busy(mut self, frame: Option<u8>) -> Self {
        self.busy_frame = frame;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                format!(" {}: {} ", self.score_label, self.running_score),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(format!("Next: #{}", self.sequence_counter), self.theme.text_style()),
            Span::raw(" | "),
            Span::styled(self.view.label(), self.theme.title_style(true)),
        ];

        if let Some(frame) = self.busy_frame {
            let spinner = SPINNER[frame as usize % SPINNER.len()];
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("{spinner} busy"),
                Style::default().fg(Color::Yellow),
            ));
        }

        if let Some(message) = self.message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message, self.theme.system_style()));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Key hints for the current view and input mode.
pub struct HotkeyBarWidget<'a> {
    view: View,
    input_mode: InputMode,
    theme: &'a DrillTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(view: View, input_mode: InputMode, theme: &'a DrillTheme) -> Self {
        Self {
            view,
            input_mode,
            theme,
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match (self.input_mode, self.view) {
            (InputMode::Question, _) => &[("Enter", "send"), ("Esc", "cancel")],
            (InputMode::Normal, View::Trainee) => &[
                ("g", "generate"),
                ("1-9", "choose"),
                ("i", "ask"),
                ("h", "history"),
                ("Tab", "facilitator"),
                ("?", "help"),
                ("q", "quit"),
            ],
            (InputMode::Normal, View::Facilitator) => &[
                ("g", "generate"),
                ("1-9", "choose"),
                ("n", "notes"),
                ("x", "clear history"),
                ("r", "reset score"),
                ("Tab", "trainee"),
                ("q", "quit"),
            ],
        }
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (key, action) in self.hints() {
            spans.push(Span::styled(format!(" {key} "), self.theme.option_style()));
            spans.push(Span::styled(format!("{action} "), self.theme.system_style()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_hints_only_in_facilitator_view() {
        let theme = DrillTheme::default();
        let trainee = HotkeyBarWidget::new(View::Trainee, InputMode::Normal, &theme);
        let facilitator = HotkeyBarWidget::new(View::Facilitator, InputMode::Normal, &theme);

        assert!(!trainee.hints().iter().any(|(key, _)| *key == "r"));
        assert!(facilitator.hints().iter().any(|(key, _)| *key == "r"));
        assert!(facilitator.hints().iter().any(|(key, _)| *key == "x"));
    }

    #[test]
    fn test_question_mode_hints() {
        let theme = DrillTheme::default();
        let bar = HotkeyBarWidget::new(View::Facilitator, InputMode::Question, &theme);
        assert_eq!(bar.hints(), &[("Enter", "send"), ("Esc", "cancel")]);
    }
}
