//! The interactive terminal presentation layer.
//!
//! `Console` is generic over its input and output so the whole interview loop
//! can be driven from a byte buffer in tests.

use anyhow::Result;
use interview_core::{Difficulty, InterviewController, InterviewError, SessionStatus, Topic};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;

use crate::render;

/// Runs `future` unless the user presses Ctrl-C first.
///
/// Dropping an interview call mid-flight leaves the session untouched, so a
/// cancelled call can simply be issued again.
pub async fn cancellable<F: Future>(future: F) -> Option<F::Output> {
    tokio::select! {
        output = future => Some(output),
        _ = tokio::signal::ctrl_c() => {
            debug!("Pending call cancelled by the user");
            None
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<BufReader<Stdin>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        self.output.flush()?;
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Reads one line without its terminator. `None` at end of input.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Asks for a topic by menu number, name or free text. `None` at end of input.
    pub async fn choose_topic(&mut self) -> Result<Option<Topic>> {
        self.say(render::topic_menu())?;
        let custom_choice = Topic::PREDEFINED.len() + 1;
        loop {
            self.prompt("Topic number or name: ")?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };

            let topic = match line.trim().parse::<usize>() {
                Ok(n) if (1..=Topic::PREDEFINED.len()).contains(&n) => {
                    Ok(Topic::PREDEFINED[n - 1].clone())
                }
                Ok(n) if n == custom_choice => {
                    self.prompt("Enter your custom topic: ")?;
                    let Some(custom) = self.read_line().await? else {
                        return Ok(None);
                    };
                    Topic::custom(custom)
                }
                Ok(_) => {
                    self.say(format!("Please pick a number between 1 and {custom_choice}."))?;
                    continue;
                }
                Err(_) => Topic::resolve(&line),
            };

            match topic {
                Ok(topic) => return Ok(Some(topic)),
                Err(e) => self.say(format!("{e}. Please try again."))?,
            }
        }
    }

    /// Picks one of `models`, asking only when there is a choice to make.
    pub async fn choose_model(&mut self, models: &[String]) -> Result<Option<String>> {
        match models {
            [] => return Ok(None),
            [only] => return Ok(Some(only.clone())),
            _ => {}
        }
        self.say(render::model_menu(models))?;
        loop {
            self.prompt("Model number or name: ")?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            let choice = line.trim();
            let picked = match choice.parse::<usize>() {
                Ok(n) if (1..=models.len()).contains(&n) => Some(models[n - 1].clone()),
                _ => models.iter().find(|m| m.as_str() == choice).cloned(),
            };
            match picked {
                Some(model) => return Ok(Some(model)),
                None => self.say(format!("Unknown model '{choice}'."))?,
            }
        }
    }

    /// Runs one interview until it ends, the user ends it, or input runs out.
    pub async fn run_interview(
        &mut self,
        controller: &mut InterviewController,
        topic: Topic,
        initial: Difficulty,
    ) -> Result<()> {
        controller.start(topic.clone(), initial)?;
        self.say(format!(
            "Interview: {topic} (starting at level {}/{}). Type /help for commands.",
            controller.session().difficulty,
            controller.session().range.max()
        ))?;

        loop {
            if controller.status() == SessionStatus::Ended {
                self.say(render::summary(controller.session()))?;
                return Ok(());
            }

            if controller.session().open_turn().is_none() {
                self.say("Generating your next question...")?;
                match cancellable(controller.ask_next_question()).await {
                    Some(Ok(question)) => {
                        let session = controller.session();
                        self.say(format!(
                            "\nQuestion {} (level {}/{}):\n{question}",
                            session.questions_asked(),
                            session.difficulty,
                            session.range.max()
                        ))?;
                    }
                    Some(Err(e)) => {
                        self.say(format!("Error generating question: {e}"))?;
                        self.say("Press Enter to try again, or /end to stop.")?;
                    }
                    None => self.say("Cancelled. Press Enter to try again, or /end to stop.")?,
                }
            }

            self.prompt("> ")?;
            let line = match cancellable(self.read_line()).await {
                Some(line) => line?.unwrap_or_else(|| "/end".to_string()),
                None => "/end".to_string(),
            };
            let input = line.trim();

            if let Some(command) = input.strip_prefix('/') {
                match command.to_lowercase().as_str() {
                    "help" => self.say(render::HELP)?,
                    "status" => self.say(render::progress(controller.session()))?,
                    "history" => self.say(render::history(controller.session()))?,
                    "new" => {
                        controller.reset();
                        controller.start(topic.clone(), initial)?;
                        self.say(format!("Starting a new interview on {topic}."))?;
                    }
                    "end" | "quit" | "exit" => {
                        controller.end()?;
                        self.say(render::summary(controller.session()))?;
                        return Ok(());
                    }
                    other => {
                        self.say(format!("Unknown command '/{other}'. Type /help for commands."))?
                    }
                }
                continue;
            }

            if controller.session().open_turn().is_none() {
                // No question is pending, so any input retries generation.
                continue;
            }
            if input.is_empty() {
                self.say("Please provide an answer before submitting.")?;
                continue;
            }

            self.say("Evaluating your answer...")?;
            match cancellable(controller.submit_answer(input)).await {
                Some(Ok(outcome)) => self.say(render::outcome(&outcome))?,
                Some(Err(InterviewError::EmptyAnswer)) => {
                    self.say("Please provide an answer before submitting.")?
                }
                Some(Err(e)) => {
                    self.say(format!("Error evaluating answer: {e}"))?;
                    self.say("Submit your answer again to retry.")?;
                }
                None => self.say("Cancelled. Your answer was not submitted; enter it again to retry.")?,
            }
        }
    }
}
