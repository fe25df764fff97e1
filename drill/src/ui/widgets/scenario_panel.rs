//! Current scenario, its options and (for facilitators) the notes

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use drill_core::{Scenario, ScenarioProfile};

use crate::ui::theme::DrillTheme;

pub struct ScenarioPanelWidget<'a> {
    scenario: Option<&'a Scenario>,
    profile: &'a ScenarioProfile,
    theme: &'a DrillTheme,
    show_notes: bool,
    show_scores: bool,
    focused: bool,
}

impl<'a> ScenarioPanelWidget<'a> {
    pub fn new(
        scenario: Option<&'a Scenario>,
        profile: &'a ScenarioProfile,
        theme: &'a DrillTheme,
    ) -> Self {
        Self {
            scenario,
            profile,
            theme,
            show_notes: false,
            show_scores: false,
            focused: false,
        }
    }

    pub fn show_notes(mut self, show: bool) -> Self {
        self.show_notes = show;
        self
    }

    /// Reveal each option's score next to its description.
    pub fn show_scores(mut self, show: bool) -> Self {
        self.show_scores = show;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let Some(scenario) = self.scenario else {
            return vec![Line::from(Span::styled(
                format!(
                    "No {} yet. Press 'g' to generate one.",
                    self.profile.scenario_noun.to_lowercase()
                ),
                self.theme.system_style(),
            ))];
        };

        let mut lines: Vec<Line> = scenario
            .body
            .lines()
            .map(|line| Line::from(Span::styled(line, self.theme.text_style())))
            .collect();

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Options",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        if scenario.options.is_empty() {
            lines.push(Line::from(Span::styled(
                "(none could be read from this completion)",
                self.theme.system_style(),
            )));
        }
        for (i, option) in scenario.options.iter().enumerate() {
            let mut spans = vec![
                Span::styled(format!("[{}] ", i + 1), self.theme.option_style()),
                Span::raw(option.description.as_str()),
            ];
            if self.show_scores {
                let color = option
                    .score()
                    .map_or(self.theme.foreground, |score| self.theme.score_color(score));
                spans.push(Span::styled(
                    format!(" ({}: {})", self.profile.score_label, option.raw_score),
                    Style::default().fg(color),
                ));
            }
            lines.push(Line::from(spans));
        }

        if self.show_notes {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                self.profile.notes_label.as_str(),
                self.theme.notes_style().add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                scenario
                    .notes
                    .lines()
                    .map(|line| Line::from(Span::styled(line, self.theme.notes_style()))),
            );
        }

        lines
    }
}

impl Widget for ScenarioPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.scenario {
            Some(scenario) => format!(
                " {} {}: {} ",
                self.profile.scenario_noun,
                scenario.sequence_number,
                scenario.title()
            ),
            None => format!(" {} ", self.profile.scenario_noun),
        };

        let block = Block::default()
            .title(Span::styled(title, self.theme.title_style(self.focused)))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
