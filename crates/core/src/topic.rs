use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InterviewError;

/// Typed input shorter than this is only matched against exact names and aliases.
const MIN_FUZZY_PATTERN_LEN: usize = 3;

/// The subject an interview is conducted on.
///
/// Predefined topics cover the common practice areas; anything else the user
/// types becomes a `Custom` topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Topic {
    PythonProgramming,
    JavaScriptDevelopment,
    MachineLearning,
    DataScience,
    WebDevelopment,
    SystemDesign,
    DatabaseDesign,
    DevOps,
    Cybersecurity,
    Custom(String),
}

impl Topic {
    /// Every predefined topic, in menu order.
    pub const PREDEFINED: [Topic; 9] = [
        Topic::PythonProgramming,
        Topic::JavaScriptDevelopment,
        Topic::MachineLearning,
        Topic::DataScience,
        Topic::WebDevelopment,
        Topic::SystemDesign,
        Topic::DatabaseDesign,
        Topic::DevOps,
        Topic::Cybersecurity,
    ];

    /// Human readable name used in prompts and in the terminal.
    pub fn name(&self) -> &str {
        match self {
            Topic::PythonProgramming => "Python Programming",
            Topic::JavaScriptDevelopment => "JavaScript Development",
            Topic::MachineLearning => "Machine Learning",
            Topic::DataScience => "Data Science",
            Topic::WebDevelopment => "Web Development",
            Topic::SystemDesign => "System Design",
            Topic::DatabaseDesign => "Database Design",
            Topic::DevOps => "DevOps",
            Topic::Cybersecurity => "Cybersecurity",
            Topic::Custom(name) => name,
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Topic::PythonProgramming => &["python", "py"],
            Topic::JavaScriptDevelopment => &["javascript", "js", "typescript", "ts"],
            Topic::MachineLearning => &["ml"],
            Topic::DataScience => &["ds"],
            Topic::WebDevelopment => &["web"],
            Topic::SystemDesign => &["systems"],
            Topic::DatabaseDesign => &["databases", "sql", "db"],
            Topic::DevOps => &["ops"],
            Topic::Cybersecurity => &["security", "infosec"],
            Topic::Custom(_) => &[],
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Topic::Custom(_))
    }

    /// Builds a custom topic, rejecting blank names.
    pub fn custom(name: impl Into<String>) -> Result<Self, InterviewError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(InterviewError::InvalidTopic);
        }
        Ok(Topic::Custom(name))
    }

    /// Resolves an exact (case-insensitive) name or alias, or falls back to a custom topic.
    pub fn from_name(input: &str) -> Result<Self, InterviewError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InterviewError::InvalidTopic);
        }
        let lowered = trimmed.to_lowercase();
        let exact = Self::PREDEFINED.into_iter().find(|topic| {
            topic.name().eq_ignore_ascii_case(trimmed) || topic.aliases().contains(&lowered.as_str())
        });
        Ok(exact.unwrap_or_else(|| Topic::Custom(trimmed.to_string())))
    }

    /// Resolves free-form user input to a topic.
    ///
    /// Exact names and aliases win. Otherwise input that abbreviates a
    /// predefined name word by word (`pyth prog`, `sys design`) resolves to
    /// it, and anything else stays a custom topic exactly as typed.
    pub fn resolve(input: &str) -> Result<Self, InterviewError> {
        let topic = Self::from_name(input)?;
        if !topic.is_custom() {
            return Ok(topic);
        }

        let pattern = input.trim();
        if pattern.chars().count() < MIN_FUZZY_PATTERN_LEN {
            return Ok(topic);
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let best = Self::PREDEFINED
            .into_iter()
            .filter_map(|candidate| {
                abbreviation_score(&matcher, candidate.name(), pattern)
                    .map(|score| (score, candidate))
            })
            .max_by_key(|(score, _)| *score);

        Ok(best.map(|(_, candidate)| candidate).unwrap_or(topic))
    }
}

/// Scores `pattern` as a word-by-word abbreviation of `name`.
///
/// Both must have the same number of words, and each pattern word must start
/// like its name word and fuzzy-match the rest of it. `Java` is therefore not
/// an abbreviation of `JavaScript Development`.
fn abbreviation_score(matcher: &SkimMatcherV2, name: &str, pattern: &str) -> Option<i64> {
    let name_words: Vec<&str> = name.split_whitespace().collect();
    let pattern_words: Vec<&str> = pattern.split_whitespace().collect();
    if name_words.len() != pattern_words.len() {
        return None;
    }

    name_words
        .iter()
        .zip(&pattern_words)
        .map(|(word, abbreviation)| {
            let same_start = word
                .chars()
                .next()
                .zip(abbreviation.chars().next())
                .is_some_and(|(a, b)| a.eq_ignore_ascii_case(&b));
            if !same_start {
                return None;
            }
            matcher.fuzzy_match(word, abbreviation)
        })
        .sum()
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.name().to_string()
    }
}

impl TryFrom<String> for Topic {
    type Error = InterviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::from_name(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_names_resolve_to_predefined() {
        for topic in Topic::PREDEFINED {
            assert_eq!(Topic::from_name(topic.name()).unwrap(), topic);
            assert_eq!(
                Topic::from_name(&topic.name().to_uppercase()).unwrap(),
                topic
            );
        }
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(Topic::from_name("ml").unwrap(), Topic::MachineLearning);
        assert_eq!(Topic::from_name(" JS ").unwrap(), Topic::JavaScriptDevelopment);
        assert_eq!(Topic::from_name("sql").unwrap(), Topic::DatabaseDesign);
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        assert!(matches!(
            Topic::from_name("   "),
            Err(InterviewError::InvalidTopic)
        ));
        assert!(matches!(Topic::resolve(""), Err(InterviewError::InvalidTopic)));
        assert!(matches!(Topic::custom("\t"), Err(InterviewError::InvalidTopic)));
    }

    #[test]
    fn test_fuzzy_resolution() {
        assert_eq!(Topic::resolve("pyth prog").unwrap(), Topic::PythonProgramming);
        assert_eq!(Topic::resolve("sys design").unwrap(), Topic::SystemDesign);
        assert_eq!(Topic::resolve("cyber").unwrap(), Topic::Cybersecurity);
        assert_eq!(Topic::resolve("Web Dev").unwrap(), Topic::WebDevelopment);
        assert_eq!(Topic::resolve("mach learn").unwrap(), Topic::MachineLearning);
    }

    #[test]
    fn test_related_subjects_stay_custom() {
        for input in ["Java", "Rust", "Data Engineering", "Cloud Security", "Database", "Machine"] {
            assert_eq!(
                Topic::resolve(input).unwrap(),
                Topic::Custom(input.to_string()),
                "{input} should not be taken over by a predefined topic"
            );
        }
    }

    #[test]
    fn test_unmatched_input_becomes_custom() {
        let topic = Topic::resolve("  Rust Async Runtimes ").unwrap();
        assert_eq!(topic, Topic::Custom("Rust Async Runtimes".to_string()));
        assert!(topic.is_custom());
        assert_eq!(topic.to_string(), "Rust Async Runtimes");
    }

    #[test]
    fn test_serde_uses_display_name() {
        let json = serde_json::to_string(&Topic::DevOps).unwrap();
        assert_eq!(json, "\"DevOps\"");

        let parsed: Topic = serde_json::from_str("\"Kubernetes\"").unwrap();
        assert_eq!(parsed, Topic::Custom("Kubernetes".to_string()));

        assert!(serde_json::from_str::<Topic>("\"\"").is_err());
    }
}
