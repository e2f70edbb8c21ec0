//! Answer evaluations and the structured reply format the evaluator role produces.
//!
//! The evaluator is asked to answer with one `KEY: value` line per field:
//!
//! ```text
//! SCORE: 7/10
//! CORRECT: what was right
//! IMPROVE: what needs work
//! SUGGESTION: how to improve
//! INCREASE_DIFFICULTY: YES
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest score the evaluator can award.
pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correctness {
    Correct,
    PartiallyCorrect,
    Incorrect,
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correctness::Correct => write!(f, "correct"),
            Correctness::PartiallyCorrect => write!(f, "partially correct"),
            Correctness::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Written feedback attached to an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// What the candidate got right.
    pub correct: String,
    /// What needs improvement.
    pub improve: String,
    /// How a better answer would look.
    pub suggestion: String,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Correct", &self.correct),
            ("Improve", &self.improve),
            ("Suggestion", &self.suggestion),
        ];
        let mut first = true;
        for (label, text) in sections {
            if text.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            write!(f, "{label}: {text}")?;
            first = false;
        }
        Ok(())
    }
}

/// The evaluator's verdict on one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score out of [`MAX_SCORE`].
    pub score: u8,
    pub correctness: Correctness,
    pub feedback: Feedback,
    /// Signed level adjustment requested by the evaluator, in `-1..=1`.
    pub difficulty_delta: i8,
}

/// Maps a raw score and the evaluator's recommendation onto correctness and a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationRules {
    /// Scores at or above this are `Correct`.
    pub correct_at: u8,
    /// Scores at or above this (and below `correct_at`) are `PartiallyCorrect`.
    pub partial_at: u8,
    /// Scores at or below this lower the difficulty unless an increase was honored.
    pub demote_at_or_below: Option<u8>,
}

impl Default for EvaluationRules {
    fn default() -> Self {
        Self {
            correct_at: 8,
            partial_at: 5,
            demote_at_or_below: Some(3),
        }
    }
}

impl EvaluationRules {
    pub fn correctness(&self, score: u8) -> Correctness {
        if score >= self.correct_at {
            Correctness::Correct
        } else if score >= self.partial_at {
            Correctness::PartiallyCorrect
        } else {
            Correctness::Incorrect
        }
    }

    /// An increase is only honored for answers scoring at least `partial_at`.
    pub fn delta(&self, score: u8, increase_recommended: bool) -> i8 {
        if increase_recommended && score >= self.partial_at {
            1
        } else if self.demote_at_or_below.is_some_and(|floor| score <= floor) {
            -1
        } else {
            0
        }
    }
}

#[derive(Clone, Copy)]
enum Section {
    Correct,
    Improve,
    Suggestion,
}

/// Parses the evaluator's structured reply.
///
/// Keys are matched case-insensitively and may carry list bullets or
/// markdown bold markers. Lines without a known key continue the previous
/// text section. A reply without a parseable `SCORE` line is rejected.
pub fn parse_evaluation(text: &str, rules: &EvaluationRules) -> Result<Evaluation> {
    let mut score: Option<u8> = None;
    let mut increase = false;
    let mut feedback = Feedback::default();
    let mut section: Option<Section> = None;

    for raw in text.lines() {
        let line = raw.replace("**", "");
        let line = line
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c == '#' || c.is_whitespace());
        if line.is_empty() {
            continue;
        }

        let keyed = line.split_once(':').and_then(|(key, value)| {
            let key = key.trim().to_uppercase().replace(' ', "_");
            match key.as_str() {
                "SCORE" | "CORRECT" | "IMPROVE" | "SUGGESTION" | "INCREASE_DIFFICULTY" => {
                    Some((key, value.trim()))
                }
                _ => None,
            }
        });

        let Some((key, value)) = keyed else {
            if let Some(current) = section {
                append_line(section_text(&mut feedback, current), line);
            }
            continue;
        };

        match key.as_str() {
            "SCORE" => {
                score = Some(parse_score(value)?);
                section = None;
            }
            "INCREASE_DIFFICULTY" => {
                increase = value.to_uppercase().starts_with("YES");
                section = None;
            }
            "CORRECT" => section = Some(Section::Correct),
            "IMPROVE" => section = Some(Section::Improve),
            _ => section = Some(Section::Suggestion),
        }
        if let Some(current) = section {
            append_line(section_text(&mut feedback, current), value);
        }
    }

    let Some(score) = score else {
        bail!("evaluation reply has no SCORE line");
    };

    Ok(Evaluation {
        score,
        correctness: rules.correctness(score),
        feedback,
        difficulty_delta: rules.delta(score, increase),
    })
}

fn section_text(feedback: &mut Feedback, section: Section) -> &mut String {
    match section {
        Section::Correct => &mut feedback.correct,
        Section::Improve => &mut feedback.improve,
        Section::Suggestion => &mut feedback.suggestion,
    }
}

fn append_line(target: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

/// Parses `n` or `n/d`, rescaling `n/d` onto `0..=MAX_SCORE`.
fn parse_score(value: &str) -> Result<u8> {
    let (numerator, denominator) = match value.split_once('/') {
        Some((n, d)) => (n.trim(), leading_number(d)),
        None => (value.trim(), None),
    };
    let Ok(parsed) = numerator.parse::<f32>() else {
        bail!("unparseable score '{value}'");
    };
    if !parsed.is_finite() || parsed < 0.0 {
        bail!("unparseable score '{value}'");
    }
    let scaled = match denominator {
        Some(d) if d > 0.0 => parsed / d * f32::from(MAX_SCORE),
        _ => parsed,
    };
    Ok(scaled.round().min(f32::from(MAX_SCORE)) as u8)
}

/// The number at the start of `text`, e.g. `10` in `10 (solid answer)`.
fn leading_number(text: &str) -> Option<f32> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    text[..end].parse::<f32>().ok().filter(|d| d.is_finite())
}
