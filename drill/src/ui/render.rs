//! Render orchestration for the drill TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use drill_core::TextOracle;

use crate::app::{App, InputMode, PendingCall, View};
use crate::ui::widgets::{
    HistoryWidget, HotkeyBarWidget, InputWidget, ScenarioPanelWidget, StatusBarWidget,
    TranscriptWidget,
};

/// Overlay types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

/// Screen regions for one frame.
struct AppLayout {
    title_area: Rect,
    transcript_area: Rect,
    history_area: Rect,
    scenario_area: Rect,
    status_bar: Rect,
    hotkey_bar: Rect,
    input_area: Rect,
}

impl AppLayout {
    fn calculate(area: Rect, history_expanded: bool) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(10),   // Main
                Constraint::Length(1), // Status
                Constraint::Length(1), // Hotkeys
                Constraint::Length(3), // Input
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);

        let history_height = if history_expanded {
            Constraint::Percentage(60)
        } else {
            Constraint::Length(7)
        };
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), history_height])
            .split(columns[0]);

        Self {
            title_area: rows[0],
            transcript_area: left[0],
            history_area: left[1],
            scenario_area: columns[1],
            status_bar: rows[2],
            hotkey_bar: rows[3],
            input_area: rows[4],
        }
    }
}

/// Main render function
pub fn render<O: TextOracle + 'static>(frame: &mut Frame, app: &App<O>) {
    let area = frame.area();
    let layout = AppLayout::calculate(area, app.history_expanded);
    let facilitator = app.view == View::Facilitator;

    render_title_bar(frame, app, layout.title_area);

    let pending_question = match app.pending() {
        Some(PendingCall::Ask(question)) => Some(question.as_str()),
        _ => None,
    };
    let transcript = TranscriptWidget::new(app.session.conversation(), &app.theme)
        .scroll(app.transcript_scroll)
        .focused(app.input_mode == InputMode::Normal)
        .pending(pending_question);
    frame.render_widget(transcript, layout.transcript_area);

    let history = HistoryWidget::new(app.session.history(), &app.profile, &app.theme)
        .expanded(app.history_expanded)
        .show_notes(facilitator && app.show_notes);
    frame.render_widget(history, layout.history_area);

    let scenario = ScenarioPanelWidget::new(app.session.current(), &app.profile, &app.theme)
        .show_notes(facilitator && app.show_notes)
        .show_scores(facilitator)
        .focused(app.session.current().is_some());
    frame.render_widget(scenario, layout.scenario_area);

    let busy_frame = app.is_busy().then_some(app.animation_frame);
    let status = StatusBarWidget::new(
        app.session.running_score(),
        app.session.sequence_counter(),
        &app.theme,
    )
    .score_label(&app.profile.score_label)
    .view(app.view)
    .busy(busy_frame)
    .message(app.status_message());
    frame.render_widget(status, layout.status_bar);

    let hotkeys = HotkeyBarWidget::new(app.view, app.input_mode, &app.theme);
    frame.render_widget(hotkeys, layout.hotkey_bar);

    render_input(frame, app, layout.input_area);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

fn render_title_bar<O: TextOracle + 'static>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let color = match app.view {
        View::Trainee => Color::White,
        View::Facilitator => Color::LightMagenta,
    };
    let title = format!(" {} | {} view ", app.profile.title, app.view.label());
    let line = Line::from(Span::styled(
        title,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input<O: TextOracle + 'static>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let placeholder = if app.is_busy() {
        "Waiting on the oracle..."
    } else {
        "Press 'i' to ask a question..."
    };

    let input = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .label(&app.profile.question_label)
        .active(app.input_mode == InputMode::Question)
        .placeholder(placeholder);

    frame.render_widget(input, area);
}

fn render_overlay<O: TextOracle + 'static>(
    frame: &mut Frame,
    app: &App<O>,
    overlay: &Overlay,
    area: Rect,
) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
    }
}

fn render_help_overlay<O: TextOracle + 'static>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let popup_area = centered_rect_fixed(52, 24, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };
    let noun = app.profile.scenario_noun.to_lowercase();

    let help_text = vec![
        Line::from(Span::styled(
            format!(" {} - Help ", app.profile.title),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Training:"),
        Line::from(format!("  g       Generate a new {noun}")),
        Line::from("  1-9     Choose an option"),
        Line::from("  i       Ask a question (Enter send, Esc cancel)"),
        Line::from("  h       Expand/collapse history"),
        Line::from(""),
        heading("Facilitator (Tab to switch view):"),
        Line::from(format!("  n       Show/hide {}", app.profile.notes_label.to_lowercase())),
        Line::from("  x       Clear history"),
        Line::from("  r       Reset score"),
        Line::from(""),
        heading("Navigation:"),
        Line::from("  j/k or ↑/↓     Scroll conversation"),
        Line::from("  G              Jump to latest"),
        Line::from("  Mouse wheel    Scroll conversation"),
        Line::from("  q              Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// A fixed-size rectangle centered in `area`, shrunk to fit.
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::testing::format_completion;
    use drill_core::{MockOracle, ScenarioEngine, ScenarioProfile, SharedEngine};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_centered_rect_fits_small_areas() {
        let rect = centered_rect_fixed(50, 20, Rect::new(0, 0, 30, 10));
        assert_eq!(rect, Rect::new(0, 0, 30, 10));

        let rect = centered_rect_fixed(10, 4, Rect::new(0, 0, 30, 10));
        assert_eq!(rect, Rect::new(10, 3, 10, 4));
    }

    #[tokio::test]
    async fn test_full_frame_renders_scenario_and_score() {
        let profile = ScenarioProfile::hipaa();
        let completion = format_completion(
            &profile,
            1,
            "Lost laptop",
            &[("Report the loss", 3), ("Wait a week", 1)],
            "Report immediately.",
        );
        let engine = ScenarioEngine::new(MockOracle::completions([completion]), profile.clone())
            .unwrap();
        let mut app = App::new(SharedEngine::new(engine), profile);
        app.request_generation();
        let response = app.response_rx.recv().await.unwrap();
        app.handle_response(response);
        app.choose(1);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("HIPAA Compliance Assistant"));
        assert!(text.contains("[1] Report the loss"));
        assert!(text.contains("Compliance Score: 3"));
        assert!(text.contains("Selected: Report the loss"));
        assert!(!text.contains("Report immediately."));
    }
}
