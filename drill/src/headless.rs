//! Headless mode for training sessions.
//!
//! A line-oriented text interface for scripted runs and automated testing:
//! - Lines starting with `#` are commands (generate, choose, status, ...)
//! - Any other non-blank line is a question for the oracle
//! - Output lines are tagged (`[SCENARIO]`, `[OPTION n]`, `[SCORE]`, `[ERROR]`)

use std::io::{self, BufRead, Write};

use drill_core::{ScenarioEngine, TextOracle};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessCommand {
    Generate,
    /// 1-based option number as typed.
    Choose(usize),
    Clear,
    Reset,
    Status,
    History,
    Notes,
    Export(String),
    Help,
    Quit,
    Ask(String),
    Invalid(String),
}

impl HeadlessCommand {
    /// Parse a trimmed, non-blank line.
    pub fn parse(line: &str) -> Self {
        let Some(command) = line.strip_prefix('#') else {
            return HeadlessCommand::Ask(line.to_string());
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        match parts.as_slice() {
            ["generate" | "gen" | "g"] => HeadlessCommand::Generate,
            ["choose" | "c", n] => match n.parse::<usize>() {
                Ok(number) if number >= 1 => HeadlessCommand::Choose(number),
                _ => HeadlessCommand::Invalid(format!("'{n}' is not an option number")),
            },
            ["choose" | "c", ..] => HeadlessCommand::Invalid("Usage: #choose <n>".into()),
            ["clear"] => HeadlessCommand::Clear,
            ["reset"] => HeadlessCommand::Reset,
            ["status"] => HeadlessCommand::Status,
            ["history"] => HeadlessCommand::History,
            ["notes"] => HeadlessCommand::Notes,
            ["export", path] => HeadlessCommand::Export(path.to_string()),
            ["export", ..] => HeadlessCommand::Invalid("Usage: #export <path>".into()),
            ["help"] => HeadlessCommand::Help,
            ["quit" | "exit"] => HeadlessCommand::Quit,
            _ => HeadlessCommand::Invalid("Unknown command. Type #help for help.".into()),
        }
    }
}

/// Run the session over a line protocol until `#quit` or end of input.
pub async fn run_headless<O, R, W>(
    engine: &mut ScenarioEngine<O>,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    O: TextOracle,
    R: BufRead,
    W: Write,
{
    writeln!(out, "=== {} (headless) ===", engine.profile().title)?;
    write_help(out)?;
    writeln!(out)?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = HeadlessCommand::parse(line);
        if command == HeadlessCommand::Quit {
            writeln!(out, "Goodbye!")?;
            break;
        }
        execute(engine, command, out).await?;
        out.flush()?;
    }

    Ok(())
}

async fn execute<O: TextOracle, W: Write>(
    engine: &mut ScenarioEngine<O>,
    command: HeadlessCommand,
    out: &mut W,
) -> io::Result<()> {
    match command {
        HeadlessCommand::Generate => match engine.generate().await.cloned() {
            Ok(scenario) => {
                let profile = engine.profile();
                writeln!(out, "[SCENARIO] {} {}", profile.scenario_noun, scenario.sequence_number)?;
                writeln!(out, "{}", scenario.body)?;
                for (i, option) in scenario.options.iter().enumerate() {
                    writeln!(
                        out,
                        "[OPTION {}] {} ({}: {})",
                        i + 1,
                        option.description,
                        profile.score_label,
                        option.raw_score
                    )?;
                }
                if scenario.options.is_empty() {
                    writeln!(out, "[WARN] No options could be read; try #generate again")?;
                }
            }
            Err(e) => write_error(out, &e)?,
        },
        HeadlessCommand::Choose(number) => match engine.choose(number - 1) {
            Ok(selection) => writeln!(
                out,
                "[SCORE] +{} (total {})",
                selection.awarded_score,
                engine.running_score()
            )?,
            Err(e) => write_error(out, &e)?,
        },
        HeadlessCommand::Clear => {
            engine.clear();
            writeln!(out, "[CLEARED] History cleared (score kept at {})", engine.running_score())?;
        }
        HeadlessCommand::Reset => {
            engine.reset_score();
            writeln!(out, "[SCORE] 0")?;
        }
        HeadlessCommand::Status => {
            let profile = engine.profile();
            writeln!(out, "[STATUS]")?;
            writeln!(out, "  Profile: {}", profile.name)?;
            writeln!(out, "  {}: {}", profile.score_label, engine.running_score())?;
            writeln!(out, "  Next {}: {}", profile.scenario_noun, engine.sequence_counter())?;
            writeln!(out, "  History: {} entries", engine.history().len())?;
            match engine.current() {
                Some(scenario) => writeln!(out, "  Current: {}", scenario.title())?,
                None => writeln!(out, "  Current: none")?,
            }
        }
        HeadlessCommand::History => {
            writeln!(out, "[HISTORY]")?;
            let noun = &engine.profile().scenario_noun;
            for entry in engine.history() {
                let outcome = match &entry.selection {
                    Some(selection) => {
                        format!("{} (+{})", selection.description, selection.awarded_score)
                    }
                    None => "unanswered".to_string(),
                };
                writeln!(
                    out,
                    "  {noun} {}: {} -> {outcome}",
                    entry.scenario.sequence_number,
                    entry.scenario.title()
                )?;
            }
        }
        HeadlessCommand::Notes => match engine.current() {
            Some(scenario) => {
                writeln!(out, "[NOTES] {}", engine.profile().notes_label)?;
                writeln!(out, "{}", scenario.notes)?;
            }
            None => writeln!(out, "[ERROR] No scenario is active")?,
        },
        HeadlessCommand::Export(path) => match engine.export_transcript(&path).await {
            Ok(()) => writeln!(out, "[EXPORTED] {path}")?,
            Err(e) => write_error(out, &e)?,
        },
        HeadlessCommand::Help => {
            writeln!(out, "[HELP]")?;
            write_help(out)?;
        }
        HeadlessCommand::Ask(question) => match engine.ask(&question).await {
            Ok(answer) => {
                writeln!(out, "[ANSWER]")?;
                writeln!(out, "{answer}")?;
            }
            Err(e) => write_error(out, &e)?,
        },
        HeadlessCommand::Invalid(message) => writeln!(out, "[ERROR] {message}")?,
        HeadlessCommand::Quit => {}
    }
    Ok(())
}

fn write_error<W: Write>(out: &mut W, error: &drill_core::EngineError) -> io::Result<()> {
    if error.is_retryable() {
        writeln!(out, "[ERROR] {error} (retry the command)")
    } else {
        writeln!(out, "[ERROR] {error}")
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "  #generate      - Generate a new scenario")?;
    writeln!(out, "  #choose <n>    - Choose option n")?;
    writeln!(out, "  #status        - Show score and progress")?;
    writeln!(out, "  #history       - List generated scenarios")?;
    writeln!(out, "  #notes         - Show notes for the current scenario")?;
    writeln!(out, "  #clear         - Clear history (score is kept)")?;
    writeln!(out, "  #reset         - Reset score to 0")?;
    writeln!(out, "  #export <path> - Write the session as JSON")?;
    writeln!(out, "  #help          - Show this help")?;
    writeln!(out, "  #quit          - Exit")?;
    writeln!(out, "  (anything else is sent as a question)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::testing::format_completion;
    use drill_core::{MockOracle, MockReply, ScenarioProfile};

    async fn run(replies: Vec<MockReply>, script: &str) -> (String, ScenarioEngine<MockOracle>) {
        let mut engine =
            ScenarioEngine::new(MockOracle::new(replies), ScenarioProfile::hipaa()).unwrap();
        let mut out = Vec::new();
        run_headless(&mut engine, script.as_bytes(), &mut out)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), engine)
    }

    fn scenario(n: u32, title: &str) -> MockReply {
        MockReply::Completion(format_completion(
            &ScenarioProfile::hipaa(),
            n,
            title,
            &[("Report it", 3), ("Ignore it", 1)],
            "Report it every time.",
        ))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(HeadlessCommand::parse("#generate"), HeadlessCommand::Generate);
        assert_eq!(HeadlessCommand::parse("#choose 2"), HeadlessCommand::Choose(2));
        assert_eq!(
            HeadlessCommand::parse("#export out.json"),
            HeadlessCommand::Export("out.json".into())
        );
        assert_eq!(
            HeadlessCommand::parse("What is PHI?"),
            HeadlessCommand::Ask("What is PHI?".into())
        );
        assert!(matches!(HeadlessCommand::parse("#choose 0"), HeadlessCommand::Invalid(_)));
        assert!(matches!(HeadlessCommand::parse("#choose x"), HeadlessCommand::Invalid(_)));
        assert!(matches!(HeadlessCommand::parse("#choose"), HeadlessCommand::Invalid(_)));
        assert!(matches!(HeadlessCommand::parse("#dance"), HeadlessCommand::Invalid(_)));
    }

    #[tokio::test]
    async fn test_generate_choose_status() {
        let (output, engine) = run(
            vec![scenario(1, "Misdirected fax")],
            "#generate\n#choose 1\n#status\n",
        )
        .await;

        assert!(output.contains("[SCENARIO] Scenario 1"));
        assert!(output.contains("[OPTION 1] Report it (Compliance Score: 3)"));
        assert!(output.contains("[OPTION 2] Ignore it (Compliance Score: 1)"));
        assert!(output.contains("[SCORE] +3 (total 3)"));
        assert!(output.contains("  Compliance Score: 3"));
        assert!(output.contains("  Next Scenario: 2"));
        assert_eq!(engine.running_score(), 3);
    }

    #[tokio::test]
    async fn test_errors_do_not_end_the_session() {
        let (output, engine) = run(
            vec![MockReply::Failure("timeout".into()), scenario(1, "Retry")],
            "#choose 1\n#generate\n#generate\n#choose 9\n#notes\n",
        )
        .await;

        assert!(output.contains("[ERROR] Invalid selection: no scenario is active"));
        assert!(output.contains("(retry the command)"));
        assert!(output.contains("[ERROR] Invalid selection: option 8 is out of range (2 options)"));
        assert!(output.contains("[NOTES] Expert Notes\nReport it every time."));
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_questions_clear_reset_and_quit() {
        let (output, engine) = run(
            vec![scenario(1, "Snooping"), MockReply::Completion("Report it.".into())],
            "#generate\n#choose 1\nWhat now?\n#reset\n#clear\n#quit\n#generate\n",
        )
        .await;

        assert!(output.contains("[ANSWER]\nReport it."));
        assert!(output.contains("[SCORE] 0"));
        assert!(output.contains("[CLEARED] History cleared (score kept at 0)"));
        assert!(output.trim_end().ends_with("Goodbye!"));
        assert!(engine.history().is_empty());
        assert_eq!(engine.oracle().remaining(), 0);
    }

    #[tokio::test]
    async fn test_export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let (output, _) = run(
            vec![scenario(1, "Export me")],
            &format!("#generate\n#export {}\n", path.display()),
        )
        .await;

        assert!(output.contains("[EXPORTED]"));
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("Export me"));
    }
}
