//! Prompt templates for the interviewer and evaluator roles.
//!
//! Built-in templates ship with the crate. A prompts directory can override any
//! of them: every `*.md` file in it replaces the template named by its file stem.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, warn};

pub const INTERVIEWER_SYSTEM: &str = "interviewer_system";
pub const GENERATE_QUESTION: &str = "generate_question";
pub const EVALUATOR_SYSTEM: &str = "evaluator_system";
pub const EVALUATE_ANSWER: &str = "evaluate_answer";

const BUILTIN: [(&str, &str); 4] = [
    (
        INTERVIEWER_SYSTEM,
        include_str!("../prompts/interviewer_system.md"),
    ),
    (
        GENERATE_QUESTION,
        include_str!("../prompts/generate_question.md"),
    ),
    (EVALUATOR_SYSTEM, include_str!("../prompts/evaluator_system.md")),
    (EVALUATE_ANSWER, include_str!("../prompts/evaluate_answer.md")),
];

/// A named collection of prompt templates with `{placeholder}` substitution.
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<String, String>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptSet {
    /// The templates compiled into the crate.
    pub fn builtin() -> Self {
        let templates = BUILTIN
            .iter()
            .map(|(key, template)| (key.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Loads overrides from `dir` on top of the built-in templates.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt {}", path.display()))?;
            if !set.templates.contains_key(&key) {
                warn!(prompt = %key, "Loaded a prompt template that no role uses");
            }
            debug!(prompt = %key, path = %path.display(), "Prompt template overridden");
            set.templates.insert(key, content);
        }
        Ok(set)
    }

    pub fn get(&self, key: &str) -> Result<&str> {
        self.templates
            .get(key)
            .map(String::as_str)
            .with_context(|| format!("Missing prompt template: '{key}'"))
    }

    /// Renders `key`, replacing each `{name}` with its value.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> Result<String> {
        let mut rendered = self.get(key)?.to_string();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        Ok(rendered.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_are_complete() {
        let prompts = PromptSet::builtin();
        for key in [
            INTERVIEWER_SYSTEM,
            GENERATE_QUESTION,
            EVALUATOR_SYSTEM,
            EVALUATE_ANSWER,
        ] {
            assert!(!prompts.get(key).unwrap().trim().is_empty(), "{key} is empty");
        }
        assert!(prompts.get(EVALUATE_ANSWER).unwrap().contains("INCREASE_DIFFICULTY"));
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let prompts = PromptSet::builtin();
        let rendered = prompts
            .render(
                GENERATE_QUESTION,
                &[
                    ("topic", "DevOps"),
                    ("difficulty", "2"),
                    ("max_difficulty", "5"),
                    ("history", "None yet."),
                ],
            )
            .unwrap();
        assert!(rendered.contains("Generate the next interview question for DevOps at difficulty level 2/5."));
        assert!(rendered.contains("None yet."));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let err = PromptSet::builtin().render("nope", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Missing prompt template: 'nope'");
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("generate_question.md"), "Ask about {topic}.").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let prompts = PromptSet::from_dir(dir.path()).unwrap();
        assert_eq!(
            prompts
                .render(GENERATE_QUESTION, &[("topic", "Cybersecurity")])
                .unwrap(),
            "Ask about Cybersecurity."
        );
        assert_eq!(
            prompts.get(EVALUATE_ANSWER).unwrap(),
            PromptSet::builtin().get(EVALUATE_ANSWER).unwrap()
        );
        assert!(prompts.get("notes").is_err());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(PromptSet::from_dir(&missing).is_err());
    }
}
