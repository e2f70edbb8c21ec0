//! Command line interface definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Provider;

/// Practice technical interviews against a local language model.
#[derive(Parser, Debug)]
#[command(name = "interview", version, about)]
pub struct Cli {
    /// Base URL of the Ollama endpoint (overrides OLLAMA_URL).
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Directory of prompt template overrides (overrides PROMPTS_PATH).
    #[arg(long, global = true)]
    pub prompts: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the endpoint and list the installed models.
    Models,
    /// Run an interactive interview.
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Interview topic: a predefined name, an alias such as "ml", or any custom text.
    #[arg(long)]
    pub topic: Option<String>,

    /// Model to interview with (overrides INTERVIEW_MODEL).
    #[arg(long)]
    pub model: Option<String>,

    /// Which API to talk to (overrides LLM_PROVIDER).
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Starting difficulty level.
    #[arg(long, default_value_t = 1)]
    pub difficulty: u8,

    /// End the interview after this many answered questions (overrides MAX_QUESTIONS).
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Use canned questions and length-based scoring instead of a model.
    #[arg(long)]
    pub offline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "interview",
            "run",
            "--topic",
            "System Design",
            "--model",
            "mistral",
            "--provider",
            "openai",
            "--difficulty",
            "3",
            "--max-questions",
            "4",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(args.topic.as_deref(), Some("System Design"));
        assert_eq!(args.model.as_deref(), Some("mistral"));
        assert_eq!(args.provider, Some(Provider::OpenAI));
        assert_eq!(args.difficulty, 3);
        assert_eq!(args.max_questions, Some(4));
        assert!(!args.offline);
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["interview", "run", "--offline"]);
        let Command::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(args.difficulty, 1);
        assert!(args.offline);
        assert!(args.topic.is_none());
    }
}
