//! Conversation transcript widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use drill_core::{ConversationTurn, Speaker};

use crate::ui::theme::DrillTheme;

/// Widget for the user/assistant transcript
pub struct TranscriptWidget<'a> {
    turns: &'a [ConversationTurn],
    scroll: usize,
    theme: &'a DrillTheme,
    focused: bool,
    pending_question: Option<&'a str>,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(turns: &'a [ConversationTurn], theme: &'a DrillTheme) -> Self {
        Self {
            turns,
            scroll: 0,
            theme,
            focused: false,
            pending_question: None,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Show a question that is still waiting on the oracle.
    pub fn pending(mut self, question: Option<&'a str>) -> Self {
        self.pending_question = question;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines: Vec<Line> = Vec::new();

        if self.turns.is_empty() && self.pending_question.is_none() {
            lines.push(Line::from(Span::styled(
                "[ No conversation yet. Choose an option or press 'i' to ask a question. ]",
                self.theme.system_style(),
            )));
            return lines;
        }

        for turn in self.turns {
            let (prefix, style) = match turn.speaker {
                Speaker::User => ("> ", self.theme.user_style()),
                Speaker::Assistant => ("", self.theme.assistant_style()),
            };
            let mut first = true;
            for line in turn.text.lines() {
                let text = if first {
                    format!("{prefix}{line}")
                } else {
                    line.to_string()
                };
                first = false;
                lines.push(Line::from(Span::styled(text, style)));
            }
            if turn.text.is_empty() {
                lines.push(Line::from(Span::styled(prefix, style)));
            }
            lines.push(Line::from(""));
        }

        if let Some(question) = self.pending_question {
            lines.push(Line::from(Span::styled(
                format!("> {question}"),
                self.theme.user_style(),
            )));
            lines.push(Line::from(Span::styled(
                "▌",
                self.theme.assistant_style().add_modifier(Modifier::DIM),
            )));
        }

        lines
    }
}

impl Widget for TranscriptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Conversation [j/k scroll] "
        } else {
            " Conversation "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines();

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(widget: TranscriptWidget, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_turns_with_prefixes() {
        let theme = DrillTheme::default();
        let turns = vec![
            ConversationTurn::user("Selected: Report it"),
            ConversationTurn::assistant("Option selected. Score: 3"),
        ];

        let text = render_to_string(TranscriptWidget::new(&turns, &theme), 50, 8);

        assert!(text.contains("> Selected: Report it"));
        assert!(text.contains("Option selected. Score: 3"));
    }

    #[test]
    fn test_empty_question_still_has_a_line() {
        let theme = DrillTheme::default();
        let turns = vec![ConversationTurn::user(""), ConversationTurn::assistant("Ask away.")];
        let widget = TranscriptWidget::new(&turns, &theme);
        let lines = widget.lines();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_pending_question_is_shown() {
        let theme = DrillTheme::default();
        let widget = TranscriptWidget::new(&[], &theme).pending(Some("Who do I call?"));
        let text = render_to_string(widget, 40, 6);
        assert!(text.contains("> Who do I call?"));
        assert!(!text.contains("No conversation yet"));
    }
}
