//! Question and Evaluation Generation
//!
//! This module defines the collaborator the interview controller relies on to
//! produce questions and judge answers. The production implementation plays
//! two LLM roles, an interviewer and an evaluator, through prompt templates.
//! An offline implementation provides canned output for demos and wiring tests.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    difficulty::{Difficulty, DifficultyRange},
    evaluation::{Evaluation, EvaluationRules, parse_evaluation},
    llm_client::LLMClient,
    prompts::{EVALUATE_ANSWER, EVALUATOR_SYSTEM, GENERATE_QUESTION, INTERVIEWER_SYSTEM, PromptSet},
    session::Turn,
    topic::Topic,
};

/// Everything the interviewer needs to ask the next question.
#[derive(Debug, Clone)]
pub struct QuestionContext {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub range: DifficultyRange,
    /// The most recent closed turns, oldest first.
    pub recent_turns: Vec<Turn>,
}

/// Everything the evaluator needs to judge an answer.
#[derive(Debug, Clone)]
pub struct AnswerContext {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub range: DifficultyRange,
    pub question: String,
    pub answer: String,
}

/// Defines the contract for anything that can drive an interview.
///
/// Both calls may take as long as the model needs and may fail with a
/// transport or availability error. Retrying is up to the implementation;
/// the controller reports failures as they come.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterviewGenerator: Send + Sync {
    /// Produces the next question for the given topic and level.
    ///
    /// The question should build on the recent turns without repeating them.
    ///
    /// # Arguments
    ///
    /// * `context` - Topic, current level, the level range and the most recent
    ///   closed turns.
    ///
    /// # Returns
    ///
    /// A `Result` containing the question text or an error.
    async fn generate_question(&self, context: QuestionContext) -> Result<String>;

    /// Scores an answer and recommends a difficulty adjustment.
    ///
    /// # Arguments
    ///
    /// * `context` - The question as asked, the candidate's answer, and the
    ///   topic and level it was asked at.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Evaluation` or an error if the evaluator
    /// could not be reached or its reply could not be parsed.
    async fn evaluate_answer(&self, context: AnswerContext) -> Result<Evaluation>;
}

/// An `InterviewGenerator` backed by an LLM playing interviewer and evaluator.
pub struct LLMInterviewGenerator {
    client: Arc<dyn LLMClient>,
    prompts: PromptSet,
    rules: EvaluationRules,
}

impl LLMInterviewGenerator {
    /// Creates a new LLM-backed interview generator.
    ///
    /// # Arguments
    ///
    /// * `client` - The model client both roles are played through.
    /// * `prompts` - Templates for both roles. Missing templates surface as
    ///   errors on the first call that needs them.
    pub fn new(client: Arc<dyn LLMClient>, prompts: PromptSet) -> Self {
        Self {
            client,
            prompts,
            rules: EvaluationRules::default(),
        }
    }

    /// Replaces the default score thresholds used when parsing evaluations.
    pub fn with_rules(mut self, rules: EvaluationRules) -> Self {
        self.rules = rules;
        self
    }
}

#[async_trait]
impl InterviewGenerator for LLMInterviewGenerator {
    #[instrument(skip_all, fields(topic = %context.topic, difficulty = %context.difficulty))]
    async fn generate_question(&self, context: QuestionContext) -> Result<String> {
        let topic = context.topic.name();
        let difficulty = context.difficulty.to_string();
        let max_difficulty = context.range.max().to_string();
        let history = render_history(&context.recent_turns);

        let system_prompt = self.prompts.render(INTERVIEWER_SYSTEM, &[("topic", topic)])?;
        let prompt = self.prompts.render(
            GENERATE_QUESTION,
            &[
                ("topic", topic),
                ("difficulty", difficulty.as_str()),
                ("max_difficulty", max_difficulty.as_str()),
                ("history", history.as_str()),
            ],
        )?;

        let reply = self
            .client
            .complete(&system_prompt, &prompt)
            .await
            .context("Interviewer request failed")?;
        let question = clean_question(&reply);
        if question.is_empty() {
            bail!("interviewer returned an empty question");
        }
        debug!(chars = question.len(), "Interviewer produced a question");
        Ok(question)
    }

    #[instrument(skip_all, fields(topic = %context.topic, difficulty = %context.difficulty))]
    async fn evaluate_answer(&self, context: AnswerContext) -> Result<Evaluation> {
        let difficulty = context.difficulty.to_string();
        let max_difficulty = context.range.max().to_string();

        let system_prompt = self.prompts.render(EVALUATOR_SYSTEM, &[])?;
        let prompt = self.prompts.render(
            EVALUATE_ANSWER,
            &[
                ("topic", context.topic.name()),
                ("question", context.question.as_str()),
                ("answer", context.answer.as_str()),
                ("difficulty", difficulty.as_str()),
                ("max_difficulty", max_difficulty.as_str()),
            ],
        )?;

        let reply = self
            .client
            .complete(&system_prompt, &prompt)
            .await
            .context("Evaluator request failed")?;
        if reply.trim().is_empty() {
            bail!("evaluator returned an empty reply");
        }
        let evaluation = parse_evaluation(&reply, &self.rules)?;
        debug!(
            score = evaluation.score,
            delta = evaluation.difficulty_delta,
            "Evaluator scored the answer"
        );
        Ok(evaluation)
    }
}

fn render_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "None yet. This is the first question.".to_string();
    }
    turns
        .iter()
        .map(|turn| {
            let mut entry = format!("Q (level {}): {}", turn.difficulty, turn.question);
            if let Some(answer) = &turn.answer {
                entry.push_str(&format!("\nA: {answer}"));
            }
            if let Some(evaluation) = &turn.evaluation {
                entry.push_str(&format!("\nScore: {}/10", evaluation.score));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strips the wrappers models like to add around a bare question.
fn clean_question(reply: &str) -> String {
    let trimmed = reply.trim();
    let trimmed = trimmed
        .strip_prefix("Question:")
        .or_else(|| trimmed.strip_prefix("**Question:**"))
        .unwrap_or(trimmed)
        .trim();
    trimmed
        .trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}')
        .trim()
        .to_string()
}

/// Deterministic questions, one bank entry per level.
const CANNED_QUESTIONS: [&str; 5] = [
    "What are the fundamental building blocks of {topic}, and what is each one for?",
    "Describe a common mistake people make with {topic} and how you would avoid it.",
    "Walk through how you would debug a problem you hit in a real {topic} project.",
    "What trade-offs would you weigh when choosing between two approaches in {topic}?",
    "Design a production-grade solution for a demanding {topic} scenario and defend your choices.",
];

/// An offline `InterviewGenerator` with predictable output.
///
/// Questions come from a fixed bank indexed by level. Answers are scored by
/// length alone, which is enough to exercise the full interview loop without
/// a model.
#[derive(Default)]
pub struct CannedInterviewGenerator {
    rules: EvaluationRules,
}

#[async_trait]
impl InterviewGenerator for CannedInterviewGenerator {
    async fn generate_question(&self, context: QuestionContext) -> Result<String> {
        let index = usize::from(context.difficulty.level().saturating_sub(1))
            .min(CANNED_QUESTIONS.len() - 1);
        let question = CANNED_QUESTIONS[index].replace("{topic}", context.topic.name());
        let asked = context
            .recent_turns
            .iter()
            .filter(|turn| turn.question.ends_with(&question))
            .count();
        if asked == 0 {
            Ok(question)
        } else {
            Ok(format!("(Follow-up {}) {question}", asked + 1))
        }
    }

    async fn evaluate_answer(&self, context: AnswerContext) -> Result<Evaluation> {
        let words = context.answer.split_whitespace().count();
        let (score, increase) = match words {
            30.. => (9, true),
            10..=29 => (6, false),
            _ => (3, false),
        };
        let reply = format!(
            "SCORE: {score}/10\n\
             CORRECT: You answered in {words} words.\n\
             IMPROVE: Add concrete examples from {topic}.\n\
             SUGGESTION: Structure the answer as definition, mechanism, example.\n\
             INCREASE_DIFFICULTY: {}",
            if increase { "YES" } else { "NO" },
            topic = context.topic,
        );
        parse_evaluation(&reply, &self.rules)
    }
}
