//! Collapsible history of generated scenarios

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use drill_core::{HistoryEntry, ScenarioProfile};

use crate::ui::theme::DrillTheme;

pub struct HistoryWidget<'a> {
    entries: &'a [HistoryEntry],
    profile: &'a ScenarioProfile,
    theme: &'a DrillTheme,
    expanded: bool,
    show_notes: bool,
}

impl<'a> HistoryWidget<'a> {
    pub fn new(
        entries: &'a [HistoryEntry],
        profile: &'a ScenarioProfile,
        theme: &'a DrillTheme,
    ) -> Self {
        Self {
            entries,
            profile,
            theme,
            expanded: false,
            show_notes: false,
        }
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn show_notes(mut self, show: bool) -> Self {
        self.show_notes = show;
        self
    }

    fn summary(&self, entry: &'a HistoryEntry) -> Line<'a> {
        let heading = Span::styled(
            format!(
                "{} {}: {}",
                self.profile.scenario_noun,
                entry.scenario.sequence_number,
                entry.scenario.title()
            ),
            self.theme.text_style(),
        );
        let outcome = match &entry.selection {
            Some(selection) => Span::styled(
                format!("  +{}", selection.awarded_score),
                Style::default().fg(self.theme.score_color(selection.awarded_score)),
            ),
            None => Span::styled("  (unanswered)", self.theme.system_style()),
        };
        Line::from(vec![heading, outcome])
    }

    fn lines(&self) -> Vec<Line<'a>> {
        if self.entries.is_empty() {
            return vec![Line::from(Span::styled(
                "Nothing generated yet",
                self.theme.system_style(),
            ))];
        }

        // Newest first; the latest scenario is the one that matters.
        let mut lines = Vec::new();
        for entry in self.entries.iter().rev() {
            lines.push(self.summary(entry));
            if !self.expanded {
                continue;
            }
            lines.extend(entry.scenario.body.lines().map(|line| {
                Line::from(Span::styled(format!("    {line}"), self.theme.text_style()))
            }));
            for (i, option) in entry.scenario.options.iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!(
                        "    {}. {} ({}: {})",
                        i + 1,
                        option.description,
                        self.profile.score_label,
                        option.raw_score
                    ),
                    self.theme.system_style(),
                )));
            }
            if let Some(selection) = &entry.selection {
                lines.push(Line::from(Span::styled(
                    format!("    Selected: {}", selection.description),
                    self.theme.user_style(),
                )));
                lines.push(Line::from(Span::styled(
                    format!("    {}: {}", self.profile.score_label, selection.awarded_score),
                    Style::default().fg(self.theme.score_color(selection.awarded_score)),
                )));
            }
            if self.show_notes {
                lines.push(Line::from(Span::styled(
                    format!("    {} {}", self.profile.notes_marker(), entry.scenario.notes),
                    self.theme.notes_style(),
                )));
            }
        }
        lines
    }
}

impl Widget for HistoryWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hint = if self.expanded { "h collapse" } else { "h expand" };
        let block = Block::default()
            .title(format!(" History ({}) [{hint}] ", self.entries.len()))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
