//! Wires configuration, backends and the console together for each command.

use anyhow::{Context, Result, bail};
use async_openai::config::OpenAIConfig;
use interview_core::llm_client::{LLMClient, OpenAICompatibleClient};
use interview_core::ollama::{self, OllamaClient};
use interview_core::prompts::PromptSet;
use interview_core::{
    CannedInterviewGenerator, Difficulty, InterviewController, InterviewGenerator,
    InterviewSettings, LLMInterviewGenerator, Topic,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::config::{Config, Provider};
use crate::console::Console;
use crate::render;

/// Loads prompt overrides from the configured directory, or the built-in set.
pub fn load_prompts(config: &Config) -> Result<PromptSet> {
    match &config.prompts_path {
        Some(dir) => {
            info!("Loading prompts from {:?}", dir);
            PromptSet::from_dir(dir)
                .with_context(|| format!("Failed to load prompts from {}", dir.display()))
        }
        None => Ok(PromptSet::builtin()),
    }
}

/// Builds the model-backed generator for `provider` and `model`.
pub fn build_generator(
    config: &Config,
    provider: Provider,
    model: &str,
) -> Result<Arc<dyn InterviewGenerator>> {
    let prompts = load_prompts(config)?;
    let client: Arc<dyn LLMClient> = match provider {
        Provider::Ollama => {
            info!("Using Ollama at {} with model '{}'", config.ollama_url, model);
            Arc::new(OllamaClient::new(
                &config.ollama_url,
                model,
                config.request_timeout,
            ))
        }
        Provider::OpenAI => {
            let api_key = config
                .openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY must be set for the 'openai' provider")?;
            let api_base = config.openai_api_base();
            info!("Using OpenAI-compatible API at {} with model '{}'", api_base, model);
            let openai_config = OpenAIConfig::new()
                .with_api_base(api_base)
                .with_api_key(api_key);
            Arc::new(OpenAICompatibleClient::new(
                openai_config,
                model.to_string(),
                config.request_timeout,
            )?)
        }
    };
    Ok(Arc::new(LLMInterviewGenerator::new(client, prompts)))
}

/// Whether an installed Ollama model name refers to `model`, ignoring the `:latest` style tag.
fn is_installed(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|name| name == model || name.split(':').next() == Some(model))
}

/// Resolves the model to interview with, asking the user when nothing was configured.
async fn select_model<R, W>(
    console: &mut Console<R, W>,
    config: &Config,
    provider: Provider,
    requested: Option<String>,
) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if provider == Provider::OpenAI {
        return requested.context("Set --model or INTERVIEW_MODEL for the 'openai' provider");
    }

    let client = OllamaClient::new(
        &config.ollama_url,
        ollama::DEFAULT_MODEL,
        config.request_timeout,
    );
    if !client.is_available().await {
        bail!(
            "Failed to connect to Ollama at {}. Is 'ollama serve' running?",
            config.ollama_url
        );
    }
    let installed = client
        .list_models()
        .await
        .context("Failed to list Ollama models")?;

    match requested {
        Some(model) => {
            if !is_installed(&installed, &model) {
                warn!("Model '{}' is not installed at {}", model, config.ollama_url);
                console.say(format!(
                    "Model '{model}' is not installed; requests may fail (try 'ollama pull {model}')."
                ))?;
            }
            Ok(model)
        }
        None => {
            if installed.is_empty() {
                bail!("No models available. Please pull a model (e.g., 'ollama pull llama2')");
            }
            console
                .choose_model(&installed)
                .await?
                .context("No model selected")
        }
    }
}

/// `interview models`: checks the endpoint and prints the installed models.
pub async fn list_models<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let client = OllamaClient::new(
        &config.ollama_url,
        ollama::DEFAULT_MODEL,
        config.request_timeout,
    );
    if !client.is_available().await {
        bail!("Failed to connect to Ollama at {}", config.ollama_url);
    }
    let models = client
        .list_models()
        .await
        .context("Failed to list Ollama models")?;

    writeln!(out, "Connected to Ollama at {}", config.ollama_url)?;
    if models.is_empty() {
        writeln!(
            out,
            "No models found. Please pull a model first (e.g., 'ollama pull llama2')."
        )?;
    } else {
        write!(out, "{}", render::model_menu(&models))?;
    }
    Ok(())
}

/// `interview run`: one interactive interview on the terminal.
pub async fn run(config: Config, args: RunArgs) -> Result<()> {
    let mut console = Console::stdio();
    run_with(&mut console, &config, args).await
}

/// Runs an interview against any console; the terminal entry point is [`run`].
pub async fn run_with<R, W>(console: &mut Console<R, W>, config: &Config, args: RunArgs) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let settings = InterviewSettings {
        range: config.difficulty_range(),
        max_questions: args.max_questions.or(config.max_questions),
        ..InterviewSettings::default()
    };

    let topic = match args.topic.as_deref() {
        Some(name) => Topic::resolve(name)?,
        None => match console.choose_topic().await? {
            Some(topic) => topic,
            None => return Ok(()),
        },
    };

    let generator: Arc<dyn InterviewGenerator> = if args.offline {
        info!("Running offline with canned questions");
        Arc::new(CannedInterviewGenerator::default())
    } else {
        let provider = args.provider.unwrap_or(config.provider);
        let requested = args.model.clone().or_else(|| config.model.clone());
        let model = select_model(console, config, provider, requested).await?;
        build_generator(config, provider, &model)?
    };

    let mut controller = InterviewController::new(generator, settings);
    console
        .run_interview(&mut controller, topic, Difficulty(args.difficulty))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            // Nothing listens on port 9 locally, so connections fail fast.
            ollama_url: "http://127.0.0.1:9".to_string(),
            model: None,
            provider: Provider::Ollama,
            openai_base_url: None,
            openai_api_key: None,
            log_filter: "warn".to_string(),
            prompts_path: None,
            request_timeout: Duration::from_secs(2),
            max_difficulty: 5,
            max_questions: None,
        }
    }

    #[test]
    fn test_load_prompts_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("generate_question.md"),
            "Ask about {topic} at level {difficulty}.",
        )
        .unwrap();
        let config = Config {
            prompts_path: Some(dir.path().to_path_buf()),
            ..test_config()
        };

        let prompts = load_prompts(&config).unwrap();
        assert_eq!(
            prompts.get("generate_question").unwrap(),
            "Ask about {topic} at level {difficulty}."
        );
    }

    #[test]
    fn test_load_prompts_missing_dir() {
        let config = Config {
            prompts_path: Some(PathBuf::from("/definitely/not/a/prompts/dir")),
            ..test_config()
        };
        let err = load_prompts(&config).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load prompts"));
    }

    #[test]
    fn test_build_generator_requires_openai_key() {
        let err = build_generator(&test_config(), Provider::OpenAI, "gpt-4o-mini")
            .err()
            .unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..test_config()
        };
        assert!(build_generator(&config, Provider::OpenAI, "gpt-4o-mini").is_ok());
        assert!(build_generator(&config, Provider::Ollama, "llama2").is_ok());
    }

    #[test]
    fn test_is_installed_ignores_tags() {
        let installed = vec!["llama2:latest".to_string(), "mistral:7b".to_string()];
        assert!(is_installed(&installed, "llama2"));
        assert!(is_installed(&installed, "mistral:7b"));
        assert!(!is_installed(&installed, "phi"));
    }

    #[tokio::test]
    async fn test_list_models_unreachable() {
        let mut out = Vec::new();
        let err = list_models(&test_config(), &mut out).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect to Ollama"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_run_offline_interview() {
        let mut console = Console::new(
            "/status\nit depends on the workload\n/end\n".as_bytes(),
            Vec::new(),
        );
        let args = RunArgs {
            topic: Some("ml".to_string()),
            difficulty: 2,
            offline: true,
            ..RunArgs::default()
        };

        run_with(&mut console, &test_config(), args).await.unwrap();
        let text = String::from_utf8(console.into_output()).unwrap();

        assert!(text.contains("Interview: Machine Learning (starting at level 2/5)"));
        assert!(text.contains("Topic: Machine Learning"));
        assert!(text.contains("Score: 3/10"));
        assert!(text.contains("Answered 1 question(s)"));
    }

    #[tokio::test]
    async fn test_run_openai_without_model() {
        let mut console = Console::new("".as_bytes(), Vec::new());
        let args = RunArgs {
            topic: Some("DevOps".to_string()),
            provider: Some(Provider::OpenAI),
            ..RunArgs::default()
        };
        let err = run_with(&mut console, &test_config(), args)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--model"));
    }
}
