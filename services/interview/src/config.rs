use clap::ValueEnum;
use interview_core::{DifficultyRange, ollama};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported LLM backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// The native Ollama API.
    Ollama,
    /// Any OpenAI-compatible chat completions API.
    #[value(name = "openai")]
    OpenAI,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub ollama_url: String,
    /// `None` means the model is picked from the endpoint at startup.
    pub model: Option<String>,
    pub provider: Provider,
    /// Explicit OpenAI-compatible base URL; defaults to Ollama's `/v1` API.
    pub openai_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    /// `RUST_LOG` directives, e.g. `info` or `info,reqwest=warn`.
    pub log_filter: String,
    /// Directory of prompt overrides; built-in prompts are used when unset.
    pub prompts_path: Option<PathBuf>,
    pub request_timeout: Duration,
    pub max_difficulty: u8,
    pub max_questions: Option<usize>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let ollama_url = std::env::var("OLLAMA_URL")
            .unwrap_or_else(|_| ollama::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("INTERVIEW_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty());

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "ollama" => Provider::Ollama,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of 'ollama', 'openai'", other),
                ));
            }
        };

        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok();
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
        EnvFilter::try_new(&log_filter).map_err(|e| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log filter: {}", log_filter, e),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "REQUEST_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", value),
                    ));
                }
            },
            Err(_) => ollama::DEFAULT_TIMEOUT,
        };

        let max_difficulty = match std::env::var("MAX_DIFFICULTY") {
            Ok(value) => value
                .parse::<u8>()
                .ok()
                .filter(|max| DifficultyRange::new(1, *max).is_ok())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "MAX_DIFFICULTY".to_string(),
                        format!("'{}' is not a level between 1 and 255", value),
                    )
                })?,
            Err(_) => DifficultyRange::default().max().level(),
        };

        let max_questions = match std::env::var("MAX_QUESTIONS") {
            Ok(value) => Some(value.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(
                || {
                    ConfigError::InvalidValue(
                        "MAX_QUESTIONS".to_string(),
                        format!("'{}' is not a positive number", value),
                    )
                },
            )?),
            Err(_) => None,
        };

        if provider == Provider::OpenAI && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
            ));
        }

        Ok(Self {
            ollama_url,
            model,
            provider,
            openai_base_url,
            openai_api_key,
            log_filter,
            prompts_path,
            request_timeout,
            max_difficulty,
            max_questions,
        })
    }

    /// Applies command line flags on top of the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.url {
            self.ollama_url = url.trim_end_matches('/').to_string();
        }
        if let Some(prompts) = &cli.prompts {
            self.prompts_path = Some(prompts.clone());
        }
        self
    }

    /// The tracing filter built from `log_filter`, which `from_env` has already validated.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    pub fn openai_api_base(&self) -> String {
        self.openai_base_url
            .clone()
            .unwrap_or_else(|| format!("{}/v1", self.ollama_url))
    }

    /// The difficulty range every session runs in.
    pub fn difficulty_range(&self) -> DifficultyRange {
        DifficultyRange::new(1, self.max_difficulty).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("OLLAMA_URL");
            env::remove_var("INTERVIEW_MODEL");
            env::remove_var("LLM_PROVIDER");
            env::remove_var("OPENAI_BASE_URL");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
            env::remove_var("REQUEST_TIMEOUT_SECS");
            env::remove_var("MAX_DIFFICULTY");
            env::remove_var("MAX_QUESTIONS");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.model, None);
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.openai_base_url, None);
        assert_eq!(config.openai_api_base(), "http://localhost:11434/v1");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.prompts_path, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_difficulty, 5);
        assert_eq!(config.max_questions, None);
        assert_eq!(config.difficulty_range(), DifficultyRange::default());
    }

    #[test]
    #[serial]
    fn test_config_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("OLLAMA_URL", "http://gpu-box:11434/");
            env::set_var("INTERVIEW_MODEL", "mistral");
            env::set_var("LLM_PROVIDER", "OpenAI");
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("RUST_LOG", "debug,reqwest=warn");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("REQUEST_TIMEOUT_SECS", "90");
            env::set_var("MAX_DIFFICULTY", "7");
            env::set_var("MAX_QUESTIONS", "10");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.openai_api_base(), "http://gpu-box:11434/v1");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.log_filter, "debug,reqwest=warn");
        assert_eq!(
            config.env_filter().max_level_hint(),
            Some(tracing::level_filters::LevelFilter::DEBUG)
        );
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
        assert_eq!(config.request_timeout, Duration::from_secs(90));
        assert_eq!(config.difficulty_range().max().level(), 7);
        assert_eq!(config.max_questions, Some(10));
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "openai");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_values() {
        for (var, value) in [
            ("LLM_PROVIDER", "bedrock"),
            ("RUST_LOG", "info,reqwest=loud"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("MAX_DIFFICULTY", "0"),
            ("MAX_DIFFICULTY", "300"),
            ("MAX_QUESTIONS", "-1"),
        ] {
            clear_env_vars();
            unsafe {
                env::set_var(var, value);
            }

            match Config::from_env().unwrap_err() {
                ConfigError::InvalidValue(name, _) => assert_eq!(name, var),
                other => panic!("Expected InvalidValue for {var}, got {other:?}"),
            }
        }
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_cli_flags_override_env() {
        use clap::Parser;

        clear_env_vars();
        unsafe {
            env::set_var("OLLAMA_URL", "http://from-env:11434");
        }

        let cli = Cli::parse_from([
            "interview",
            "--url",
            "http://from-flag:11434/",
            "--prompts",
            "./my-prompts",
            "models",
        ]);
        let config = Config::from_env().unwrap().with_cli(&cli);

        assert_eq!(config.ollama_url, "http://from-flag:11434");
        assert_eq!(config.openai_api_base(), "http://from-flag:11434/v1");
        assert_eq!(config.prompts_path, Some(PathBuf::from("./my-prompts")));
        clear_env_vars();
    }
}
