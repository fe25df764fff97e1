//! Free-form questions about the current scenario.

use crate::oracle::{complete_within, OracleError, TextOracle};
use crate::profile::ScenarioProfile;
use crate::state::SessionState;
use std::time::Duration;

/// Answers questions using the current scenario as context.
///
/// Borrows the engine's oracle and profile for the length of one call.
pub struct ChatAdapter<'a, O: ?Sized> {
    oracle: &'a O,
    profile: &'a ScenarioProfile,
    timeout: Duration,
}

impl<'a, O: TextOracle + ?Sized> ChatAdapter<'a, O> {
    pub fn new(oracle: &'a O, profile: &'a ScenarioProfile, timeout: Duration) -> Self {
        Self {
            oracle,
            profile,
            timeout,
        }
    }

    /// The current scenario body and its options as plain text.
    pub fn build_context(&self, state: &SessionState) -> String {
        let (body, options) = match state.current() {
            Some(scenario) => (
                scenario.body.as_str(),
                scenario
                    .options
                    .iter()
                    .map(|o| (o.description.as_str(), o.raw_score.as_str()))
                    .collect::<Vec<_>>(),
            ),
            None => ("None", Vec::new()),
        };
        format!("{}: {body}\nOptions: {options:?}", self.profile.scenario_noun)
    }

    pub fn build_prompt(&self, state: &SessionState, question: &str) -> String {
        format!(
            "Context: {}\n{}: {question}",
            self.build_context(state),
            self.profile.question_label
        )
    }

    /// Ask a question and log the exchange.
    ///
    /// Both turns are appended only after the oracle answers, so a failed
    /// call leaves the transcript as it was. Empty questions are sent
    /// and logged like any other.
    pub async fn ask(
        &self,
        state: &mut SessionState,
        question: &str,
    ) -> Result<String, OracleError> {
        let prompt = self.build_prompt(state, question);
        tracing::debug!(prompt_len = prompt.len(), "asking oracle a chat question");

        let answer = complete_within(self.oracle, &prompt, self.timeout).await?;
        state.push_exchange(question, &answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ResponseOption, Scenario};
    use crate::testing::MockOracle;

    fn state_with_scenario() -> SessionState {
        let mut state = SessionState::new();
        state.push_scenario(Scenario {
            sequence_number: 1,
            body: "Scenario 1: Fax misdirected".into(),
            options: vec![
                ResponseOption::new("Recall the fax", "3"),
                ResponseOption::new("Do nothing", "1"),
            ],
            notes: "Notes".into(),
        });
        state
    }

    #[test]
    fn test_context_with_scenario() {
        let oracle = MockOracle::new(Vec::new());
        let profile = ScenarioProfile::hipaa();
        let chat = ChatAdapter::new(&oracle, &profile, Duration::from_secs(1));

        assert_eq!(
            chat.build_prompt(&state_with_scenario(), "Is this a breach?"),
            "Context: Scenario: Scenario 1: Fax misdirected\nOptions: [(\"Recall the fax\", \"3\"), (\"Do nothing\", \"1\")]\nHIPAA Question: Is this a breach?"
        );
    }

    #[test]
    fn test_context_without_scenario() {
        let oracle = MockOracle::new(Vec::new());
        let profile = ScenarioProfile::incident();
        let chat = ChatAdapter::new(&oracle, &profile, Duration::from_secs(1));

        assert_eq!(
            chat.build_context(&SessionState::new()),
            "Inject: None\nOptions: []"
        );
    }

    #[tokio::test]
    async fn test_ask_appends_both_turns() {
        let oracle = MockOracle::completions(["Yes, notify the privacy officer."]);
        let profile = ScenarioProfile::hipaa();
        let chat = ChatAdapter::new(&oracle, &profile, Duration::from_secs(1));
        let mut state = state_with_scenario();

        let answer = chat.ask(&mut state, "Is this a breach?").await.unwrap();

        assert_eq!(answer, "Yes, notify the privacy officer.");
        assert_eq!(state.conversation().len(), 2);
        assert_eq!(state.conversation()[0].text, "Is this a breach?");
        assert_eq!(state.conversation()[1].text, answer);
        assert!(oracle.prompts()[0].ends_with("HIPAA Question: Is this a breach?"));
        assert_eq!(state.running_score(), 0);
        assert_eq!(state.history().len(), 1);
    }
}
