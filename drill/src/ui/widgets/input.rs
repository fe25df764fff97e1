//! Question input widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::DrillTheme;

const PROMPT: &str = "> ";

/// Single-line question field. Scrolls sideways to keep the cursor visible.
pub struct InputWidget<'a> {
    content: &'a str,
    cursor: usize,
    theme: &'a DrillTheme,
    label: &'a str,
    placeholder: &'a str,
    active: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a DrillTheme) -> Self {
        Self {
            content,
            cursor: content.chars().count(),
            theme,
            label: "Question",
            placeholder: "Press 'i' to ask a question...",
            active: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor = pos;
        self
    }

    /// Block title, e.g. the profile's question label.
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    fn editing_line(&self, width: usize) -> Line<'a> {
        let chars: Vec<char> = self.content.chars().collect();
        let cursor = self.cursor.min(chars.len());

        // One cell is reserved for the cursor block past the last character.
        let visible = width.saturating_sub(PROMPT.len()).max(1);
        let start = (cursor + 1).saturating_sub(visible);

        let before: String = chars[start..cursor].iter().collect();
        let at: String = chars.get(cursor).map_or(" ".into(), |c| c.to_string());
        let after: String = chars
            .iter()
            .skip(cursor + 1)
            .take(visible.saturating_sub(before.chars().count() + 1))
            .collect();

        let prompt = if start > 0 { "…" } else { PROMPT };
        Line::from(vec![
            Span::styled(prompt, self.theme.user_style()),
            Span::raw(before),
            Span::styled(
                at,
                Style::default()
                    .fg(self.theme.user_text)
                    .add_modifier(Modifier::UNDERLINED | Modifier::BOLD),
            ),
            Span::raw(after),
        ])
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.label))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.active));
        let inner = block.inner(area);
        block.render(area, buf);

        let prompt = Span::styled(PROMPT, self.theme.user_style());
        let line = match (self.active, self.content.is_empty()) {
            (true, _) => self.editing_line(inner.width as usize),
            (false, true) => Line::from(vec![
                prompt,
                Span::styled(self.placeholder, Style::default().add_modifier(Modifier::DIM)),
            ]),
            (false, false) => Line::from(vec![prompt, Span::raw(self.content)]),
        };

        Paragraph::new(line).render(inner, buf);
    }
}
