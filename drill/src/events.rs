//! Event handling for the drill TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use drill_core::TextOracle;

use crate::app::{App, InputMode};

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event<O: TextOracle + 'static>(app: &mut App<O>, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

fn handle_mouse_event<O: TextOracle + 'static>(app: &mut App<O>, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_key_event<O: TextOracle + 'static>(app: &mut App<O>, key: KeyEvent) -> EventResult {
    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Question => handle_question_mode(app, key),
    }
}

/// Handle keys in NORMAL mode (hotkeys)
fn handle_normal_mode<O: TextOracle + 'static>(app: &mut App<O>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => return EventResult::Quit,

        KeyCode::Char('g') => app.request_generation(),
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(number) = c.to_digit(10) {
                app.choose(number as usize);
            }
        }
        KeyCode::Char('i') => app.enter_question_mode(),
        KeyCode::Char('h') => app.toggle_history(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_view(),

        // Facilitator actions
        KeyCode::Char('n') => app.toggle_notes(),
        KeyCode::Char('x') => app.clear_history(),
        KeyCode::Char('r') => app.reset_score(),

        KeyCode::Char('?') | KeyCode::F(1) => app.toggle_help(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

/// Handle keys while typing a question
fn handle_question_mode<O: TextOracle + 'static>(app: &mut App<O>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => app.enter_normal_mode(),
        KeyCode::Enter => {
            if app.is_busy() {
                app.set_status("Still waiting on the oracle...");
            } else {
                let question = app.submit_input();
                app.request_answer(question);
            }
        }
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Char(c) => app.type_char(c),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_overlay_key<O: TextOracle + 'static>(app: &mut App<O>, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{PendingCall, View};
    use drill_core::testing::format_completion;
    use drill_core::{MockOracle, ScenarioEngine, ScenarioProfile, SharedEngine};

    fn app(completions: Vec<String>) -> App<MockOracle> {
        let profile = ScenarioProfile::incident();
        let engine =
            ScenarioEngine::new(MockOracle::completions(completions), profile.clone()).unwrap();
        App::new(SharedEngine::new(engine), profile)
    }

    fn press(app: &mut App<MockOracle>, code: KeyCode) -> EventResult {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut App<MockOracle>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn settle(app: &mut App<MockOracle>) {
        let response = app.response_rx.recv().await.unwrap();
        app.handle_response(response);
    }

    fn inject() -> String {
        format_completion(
            &ScenarioProfile::incident(),
            1,
            "Card skimmers",
            &[("Pull the terminals", 3), ("Keep trading", 1)],
            "Pull them.",
        )
    }

    #[tokio::test]
    async fn test_generate_and_choose_with_keys() {
        let mut app = app(vec![inject()]);

        assert_eq!(press(&mut app, KeyCode::Char('g')), EventResult::NeedsRedraw);
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('2'));

        assert_eq!(app.session.running_score(), 1);
        assert_eq!(app.session.sequence_counter(), 2);
    }

    #[tokio::test]
    async fn test_question_typing_does_not_trigger_hotkeys() {
        let mut app = app(vec!["Call the bank.".into()]);

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "q? reset 1");
        assert_eq!(app.input_mode, InputMode::Question);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.pending(), Some(&PendingCall::Ask("q? reset 1".into())));
        settle(&mut app).await;

        let conversation = app.session.conversation();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1].text, "Call the bank.");
    }

    #[tokio::test]
    async fn test_escape_keeps_draft() {
        let mut app = app(Vec::new());
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.input_buffer(), "draft");
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_tab_toggles_view_and_unlocks_admin_keys() {
        let mut app = app(vec![inject()]);
        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('1'));

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session.running_score(), 3);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Facilitator);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session.running_score(), 0);
        press(&mut app, KeyCode::Char('x'));
        assert!(app.session.history().is_empty());
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = app(Vec::new());
        press(&mut app, KeyCode::Char('?'));
        assert!(app.has_overlay());

        assert_eq!(press(&mut app, KeyCode::Char('g')), EventResult::Continue);
        assert!(!app.is_busy());

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.has_overlay());
        assert_eq!(press(&mut app, KeyCode::Char('q')), EventResult::Quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_question_mode() {
        let mut app = app(Vec::new());
        press(&mut app, KeyCode::Char('i'));
        let result = handle_event(
            &mut app,
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert_eq!(result, EventResult::Quit);
    }
}
