//! Main application state and logic

use drill_core::{
    EngineError, Scenario, ScenarioProfile, SessionState, SharedEngine, TextOracle,
};
use tokio::sync::mpsc;

use crate::ui::theme::DrillTheme;
use crate::ui::Overlay;

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Hotkeys (default)
    #[default]
    Normal,
    /// Typing a question for the oracle
    Question,
}

/// Which audience the screen is laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Scenario, options, score, history and chat.
    #[default]
    Trainee,
    /// Everything the trainee sees plus notes and the admin actions.
    Facilitator,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Trainee => "Trainee",
            View::Facilitator => "Facilitator",
        }
    }
}

/// The oracle call a background task is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCall {
    Generate,
    Ask(String),
}

/// Results sent back from background oracle tasks.
#[derive(Debug)]
pub enum WorkerResponse {
    Generated(Result<Scenario, EngineError>),
    Answered {
        question: String,
        result: Result<String, EngineError>,
    },
}

/// Main application state
pub struct App<O> {
    engine: SharedEngine<O>,
    response_tx: mpsc::UnboundedSender<WorkerResponse>,
    pub response_rx: mpsc::UnboundedReceiver<WorkerResponse>,

    // Local session snapshot for rendering
    pub session: SessionState,
    pub profile: ScenarioProfile,

    // UI state
    pub theme: DrillTheme,
    pub view: View,
    pub show_notes: bool,
    pub history_expanded: bool,
    overlay: Option<Overlay>,

    // Transcript display
    pub transcript_scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,

    // Status
    status_message: Option<String>,

    pub animation_frame: u8,
    pending: Option<PendingCall>,
}

impl<O: TextOracle + 'static> App<O> {
    pub fn new(engine: SharedEngine<O>, profile: ScenarioProfile) -> Self {
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let session = engine.snapshot().unwrap_or_default();

        let mut app = Self {
            engine,
            response_tx,
            response_rx,
            session,
            profile,
            theme: DrillTheme::default(),
            view: View::default(),
            show_notes: false,
            history_expanded: false,
            overlay: None,
            transcript_scroll: 0,
            scroll_locked_to_bottom: true,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            status_message: None,
            animation_frame: 0,
            pending: None,
        };
        app.set_status(format!(
            "Press 'g' for a new {}, '?' for help",
            app.profile.scenario_noun.to_lowercase()
        ));
        app
    }

    // =========================================================================
    // Session actions
    // =========================================================================

    /// Start generating a scenario on a background task.
    pub fn request_generation(&mut self) {
        if self.reject_if_busy() {
            return;
        }
        self.pending = Some(PendingCall::Generate);
        self.set_status(format!(
            "Generating {} {}...",
            self.profile.scenario_noun.to_lowercase(),
            self.session.sequence_counter()
        ));

        let engine = self.engine.clone();
        let tx = self.response_tx.clone();
        tokio::spawn(async move {
            let result = engine.generate().await;
            let _ = tx.send(WorkerResponse::Generated(result));
        });
    }

    /// Send a question to the oracle on a background task.
    pub fn request_answer(&mut self, question: String) {
        if self.reject_if_busy() {
            return;
        }
        self.pending = Some(PendingCall::Ask(question.clone()));
        self.set_status("Waiting for an answer...");

        let engine = self.engine.clone();
        let tx = self.response_tx.clone();
        tokio::spawn(async move {
            let result = engine.ask(&question).await;
            let _ = tx.send(WorkerResponse::Answered { question, result });
        });
    }

    /// Choose option `number` as shown on screen (1-based).
    pub fn choose(&mut self, number: usize) {
        if self.reject_if_busy() {
            return;
        }
        let Some(index) = number.checked_sub(1) else {
            return;
        };
        match self.engine.choose(index) {
            Ok(selection) => {
                self.refresh();
                self.set_status(format!(
                    "Selected option {number}. {}: {} (total {})",
                    self.profile.score_label,
                    selection.awarded_score,
                    self.session.running_score()
                ));
            }
            Err(e) => self.set_status(format!("{e}")),
        }
    }

    pub fn clear_history(&mut self) {
        if !self.require_facilitator("clear the history") || self.reject_if_busy() {
            return;
        }
        match self.engine.clear() {
            Ok(()) => {
                self.refresh();
                self.set_status("History cleared");
            }
            Err(e) => self.set_status(format!("{e}")),
        }
    }

    pub fn reset_score(&mut self) {
        if !self.require_facilitator("reset the score") || self.reject_if_busy() {
            return;
        }
        match self.engine.reset_score() {
            Ok(()) => {
                self.refresh();
                self.set_status("Score reset");
            }
            Err(e) => self.set_status(format!("{e}")),
        }
    }

    pub fn toggle_notes(&mut self) {
        if !self.require_facilitator("see the notes") {
            return;
        }
        self.show_notes = !self.show_notes;
    }

    pub fn toggle_history(&mut self) {
        self.history_expanded = !self.history_expanded;
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Trainee => View::Facilitator,
            View::Facilitator => View::Trainee,
        };
        if self.view == View::Trainee {
            self.show_notes = false;
        }
        self.set_status(format!("{} view", self.view.label()));
    }

    /// Apply the result of a background oracle call.
    pub fn handle_response(&mut self, response: WorkerResponse) {
        self.pending = None;
        match response {
            WorkerResponse::Generated(Ok(scenario)) => {
                self.refresh();
                match scenario.options.len() {
                    0 => self.set_status("No options could be read; press 'g' to generate again"),
                    n => self.set_status(format!("Press 1-{} to choose", n.min(9))),
                }
            }
            WorkerResponse::Generated(Err(e)) => {
                self.set_status(retry_message(&e, "press 'g' to try again"));
            }
            WorkerResponse::Answered { result: Ok(_), .. } => {
                self.refresh();
                self.scroll_to_bottom();
                self.clear_status();
            }
            WorkerResponse::Answered { question, result: Err(e) } => {
                // Hand the question back so it can be resent.
                self.set_input(question);
                self.set_status(retry_message(&e, "press 'i' then Enter to resend"));
            }
        }
    }

    /// Drain finished background calls without blocking.
    pub fn poll_responses(&mut self) {
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
        }
    }

    /// Re-read the session snapshot from the engine.
    pub fn refresh(&mut self) {
        match self.engine.snapshot() {
            Ok(session) => self.session = session,
            Err(e) => tracing::debug!(error = %e, "snapshot skipped"),
        }
        if self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingCall> {
        self.pending.as_ref()
    }

    fn reject_if_busy(&mut self) -> bool {
        if self.is_busy() {
            self.set_status("Still waiting on the oracle...");
            true
        } else {
            false
        }
    }

    fn require_facilitator(&mut self, action: &str) -> bool {
        if self.view == View::Facilitator {
            true
        } else {
            self.set_status(format!("Switch to the facilitator view (Tab) to {action}"));
            false
        }
    }

    // =========================================================================
    // Transcript scrolling
    // =========================================================================

    /// Scroll transcript to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // The widget caps this to the real maximum.
        self.transcript_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Rough line count of the transcript, assuming ~60 columns.
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .session
            .conversation()
            .iter()
            .map(|turn| {
                turn.text
                    .lines()
                    .map(|line| (line.len() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll transcript up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.transcript_scroll > max_scroll {
            self.transcript_scroll = max_scroll;
        }
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines).min(max_scroll);
        if self.transcript_scroll == max_scroll {
            self.scroll_locked_to_bottom = true;
        }
    }

    // =========================================================================
    // Question input
    // =========================================================================

    pub fn enter_question_mode(&mut self) {
        self.input_mode = InputMode::Question;
        self.cursor_end();
    }

    /// Leave question mode, keeping whatever was typed.
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Take the typed question. Empty questions are sent too.
    pub fn submit_input(&mut self) -> String {
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
        std::mem::take(&mut self.input_buffer)
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Set input buffer content and move cursor to end (unicode-safe)
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    // =========================================================================
    // Overlay and status
    // =========================================================================

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Set status message (always overwrites)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Tick for the busy spinner
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }
}

fn retry_message(error: &EngineError, hint: &str) -> String {
    if error.is_retryable() {
        format!("Error: {error} ({hint})")
    } else {
        format!("Error: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::testing::format_completion;
    use drill_core::{MockOracle, MockReply, ScenarioEngine};

    fn app_with(replies: Vec<MockReply>) -> App<MockOracle> {
        let profile = ScenarioProfile::hipaa();
        let engine = ScenarioEngine::new(MockOracle::new(replies), profile.clone()).unwrap();
        App::new(SharedEngine::new(engine), profile)
    }

    fn scenario_reply() -> MockReply {
        MockReply::Completion(format_completion(
            &ScenarioProfile::hipaa(),
            1,
            "Misdirected fax",
            &[("Notify the privacy officer", 3), ("Ignore it", 1)],
            "Notify promptly.",
        ))
    }

    async fn settle(app: &mut App<MockOracle>) {
        let response = app.response_rx.recv().await.unwrap();
        app.handle_response(response);
    }

    #[tokio::test]
    async fn test_generate_then_choose() {
        let mut app = app_with(vec![scenario_reply()]);

        app.request_generation();
        assert!(app.is_busy());
        settle(&mut app).await;

        assert!(!app.is_busy());
        assert_eq!(app.session.current().unwrap().title(), "Misdirected fax");

        app.choose(1);
        assert_eq!(app.session.running_score(), 3);
        assert_eq!(app.session.sequence_counter(), 2);
        assert!(app.status_message().unwrap().contains("Compliance Score: 3"));
    }

    #[tokio::test]
    async fn test_second_oracle_action_is_rejected_while_pending() {
        let mut app = app_with(vec![scenario_reply()]);

        app.request_generation();
        app.request_answer("hello".into());
        app.choose(1);

        assert_eq!(app.pending(), Some(&PendingCall::Generate));
        assert_eq!(app.status_message(), Some("Still waiting on the oracle..."));
        settle(&mut app).await;
        assert!(app.session.conversation().is_empty());
        assert_eq!(app.session.running_score(), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_shows_retry() {
        let mut app = app_with(vec![MockReply::Failure("offline".into())]);

        app.request_generation();
        settle(&mut app).await;

        let status = app.status_message().unwrap();
        assert!(status.contains("offline"));
        assert!(status.contains("try again"));
        assert!(app.session.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_question_is_kept_for_resend() {
        let mut app = app_with(vec![MockReply::Failure("offline".into())]);

        app.request_answer("What is PHI?".into());
        settle(&mut app).await;

        assert_eq!(app.input_buffer(), "What is PHI?");
        assert!(app.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_admin_actions_need_facilitator_view() {
        let mut app = app_with(vec![scenario_reply()]);
        app.request_generation();
        settle(&mut app).await;
        app.choose(1);

        app.reset_score();
        assert_eq!(app.session.running_score(), 3);
        app.toggle_notes();
        assert!(!app.show_notes);

        app.toggle_view();
        app.toggle_notes();
        assert!(app.show_notes);
        app.reset_score();
        assert_eq!(app.session.running_score(), 0);
        app.clear_history();
        assert!(app.session.history().is_empty());
        assert_eq!(app.session.sequence_counter(), 1);

        app.toggle_view();
        assert!(!app.show_notes);
    }

    #[tokio::test]
    async fn test_choose_without_scenario_reports_error() {
        let mut app = app_with(Vec::new());
        app.choose(3);
        assert!(app.status_message().unwrap().contains("no scenario is active"));
    }

    #[tokio::test]
    async fn test_input_editing_is_unicode_safe() {
        let mut app = app_with(Vec::new());
        for c in "héllo".chars() {
            app.type_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input_buffer(), "hélo");
        app.cursor_home();
        app.delete();
        assert_eq!(app.input_buffer(), "élo");
        assert_eq!(app.submit_input(), "élo");
        assert_eq!(app.input_buffer(), "");
    }
}
