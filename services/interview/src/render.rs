//! Plain-text rendering of interview state for the terminal.

use interview_core::{Difficulty, DifficultyRange, Evaluation, Session, Topic, TurnOutcome};
use std::fmt::Write;

const PROGRESS_WIDTH: usize = 10;

pub fn score_band(score: u8) -> &'static str {
    match score {
        8.. => "Excellent!",
        6..=7 => "Good",
        _ => "Needs Improvement",
    }
}

pub fn progress_bar(range: DifficultyRange, level: Difficulty) -> String {
    let filled = (range.progress(level) * PROGRESS_WIDTH as f32).round() as usize;
    let filled = filled.min(PROGRESS_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

pub fn topic_menu() -> String {
    let mut out = String::from("Choose an interview topic:\n");
    for (i, topic) in Topic::PREDEFINED.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, topic);
    }
    let _ = writeln!(out, "  {:>2}. Custom topic", Topic::PREDEFINED.len() + 1);
    out
}

pub fn model_menu(models: &[String]) -> String {
    let mut out = String::from("Available models:\n");
    for (i, model) in models.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, model);
    }
    out
}

pub fn progress(session: &Session) -> String {
    let topic = session
        .topic
        .as_ref()
        .map_or_else(|| "(not chosen)".to_string(), Topic::to_string);
    format!(
        "Topic: {}\nDifficulty Level: {}/{} {}\nQuestions Asked: {}\nStatus: {}",
        topic,
        session.difficulty,
        session.range.max(),
        progress_bar(session.range, session.difficulty),
        session.questions_asked(),
        session.status,
    )
}

pub fn evaluation(evaluation: &Evaluation) -> String {
    let mut out = format!(
        "Score: {}/10 - {}",
        evaluation.score,
        score_band(evaluation.score)
    );
    let feedback = &evaluation.feedback;
    if !feedback.correct.is_empty() {
        let _ = write!(out, "\n  What you got right: {}", feedback.correct);
    }
    if !feedback.improve.is_empty() {
        let _ = write!(out, "\n  Areas for improvement: {}", feedback.improve);
    }
    if !feedback.suggestion.is_empty() {
        let _ = write!(out, "\n  Suggestion: {}", feedback.suggestion);
    }
    out
}

pub fn outcome(outcome: &TurnOutcome) -> String {
    let mut out = evaluation(&outcome.evaluation);
    let delta = outcome.evaluation.difficulty_delta;
    if outcome.current > outcome.previous {
        let _ = write!(
            out,
            "\nGreat job! Moving to difficulty level {}.",
            outcome.current
        );
    } else if outcome.current < outcome.previous {
        let _ = write!(
            out,
            "\nLet's consolidate. Stepping back to difficulty level {}.",
            outcome.current
        );
    } else if outcome.absorbed && delta > 0 {
        let _ = write!(
            out,
            "\nGreat job! You are already at the top level ({}).",
            outcome.current
        );
    } else if outcome.absorbed && delta < 0 {
        let _ = write!(out, "\nStaying at the starting level ({}).", outcome.current);
    }
    if outcome.session_ended {
        out.push_str("\nThat was the last question of this interview.");
    }
    out
}

pub fn history(session: &Session) -> String {
    if session.history.is_empty() {
        return "No questions asked yet.".to_string();
    }
    let mut out = String::from("Interview History");
    for (i, turn) in session.history.iter().enumerate() {
        let _ = write!(
            out,
            "\n\nQuestion {} (Level {}): {}",
            i + 1,
            turn.difficulty,
            turn.question
        );
        match (&turn.answer, &turn.evaluation) {
            (Some(answer), Some(eval)) => {
                let _ = write!(out, "\nYour Answer: {answer}\n{}", evaluation(eval));
            }
            _ => out.push_str("\n(awaiting answer)"),
        }
    }
    out
}

pub fn summary(session: &Session) -> String {
    let scores: Vec<u8> = session
        .history
        .iter()
        .filter_map(|turn| turn.evaluation.as_ref().map(|e| e.score))
        .collect();
    if scores.is_empty() {
        return "Interview over. No answers were evaluated.".to_string();
    }
    let total: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    let average = total as f32 / scores.len() as f32;
    format!(
        "Interview over. Answered {} question(s), average score {:.1}/10, final level {}/{}.",
        scores.len(),
        average,
        session.difficulty,
        session.range.max()
    )
}

pub const HELP: &str = "\
Type your answer and press Enter to submit it.
Commands:
  /status   show topic, difficulty and progress
  /history  show all questions, answers and feedback
  /new      discard this interview and start over on the same topic
  /end      finish the interview
  /help     show this message";

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::{Correctness, Feedback};

    fn eval(score: u8, delta: i8) -> Evaluation {
        Evaluation {
            score,
            correctness: Correctness::Correct,
            feedback: Feedback {
                correct: "Clear definition.".to_string(),
                improve: String::new(),
                suggestion: "Add an example.".to_string(),
            },
            difficulty_delta: delta,
        }
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(score_band(10), "Excellent!");
        assert_eq!(score_band(8), "Excellent!");
        assert_eq!(score_band(7), "Good");
        assert_eq!(score_band(6), "Good");
        assert_eq!(score_band(5), "Needs Improvement");
        assert_eq!(score_band(0), "Needs Improvement");
    }

    #[test]
    fn test_progress_bar() {
        let range = DifficultyRange::default();
        assert_eq!(progress_bar(range, Difficulty(1)), "[##--------]");
        assert_eq!(progress_bar(range, Difficulty(5)), "[##########]");
    }

    #[test]
    fn test_topic_menu_lists_custom_last() {
        let menu = topic_menu();
        assert!(menu.contains(" 1. Python Programming"));
        assert!(menu.contains(" 9. Cybersecurity"));
        assert!(menu.trim_end().ends_with("10. Custom topic"));
    }

    #[test]
    fn test_evaluation_skips_empty_sections() {
        let text = evaluation(&eval(9, 1));
        assert_eq!(
            text,
            "Score: 9/10 - Excellent!\n  What you got right: Clear definition.\n  Suggestion: Add an example."
        );
    }

    #[test]
    fn test_outcome_messages() {
        let raised = TurnOutcome {
            evaluation: eval(9, 1),
            previous: Difficulty(2),
            current: Difficulty(3),
            absorbed: false,
            session_ended: false,
        };
        assert!(outcome(&raised).ends_with("Moving to difficulty level 3."));

        let capped = TurnOutcome {
            previous: Difficulty(5),
            current: Difficulty(5),
            absorbed: true,
            ..raised.clone()
        };
        assert!(outcome(&capped).contains("already at the top level (5)"));

        let lowered = TurnOutcome {
            evaluation: eval(2, -1),
            previous: Difficulty(3),
            current: Difficulty(2),
            absorbed: false,
            session_ended: true,
        };
        let text = outcome(&lowered);
        assert!(text.contains("Stepping back to difficulty level 2."));
        assert!(text.ends_with("last question of this interview."));
    }
}
