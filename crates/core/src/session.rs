//! Interview Session Controller
//!
//! This module owns the interview-progression state machine. A session moves
//! from `NotStarted` to `InProgress` on start, cycles through
//! question → answer → evaluation turns, and ends explicitly or once the
//! configured question budget is spent. `Ended` is terminal; `reset` replaces
//! the session with a fresh one instead of reviving it.
//!
//! The controller mutates the session only after a generator call has
//! returned. A caller that cancels an in-flight call (by dropping the future)
//! therefore leaves the session exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    difficulty::{Difficulty, DifficultyRange},
    error::InterviewError,
    evaluation::Evaluation,
    generator::{AnswerContext, InterviewGenerator, QuestionContext},
    topic::Topic,
};

/// Largest level change a single evaluation may cause, in either direction.
pub const MAX_DELTA: i8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Ended,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::NotStarted => write!(f, "not started"),
            SessionStatus::InProgress => write!(f, "in progress"),
            SessionStatus::Ended => write!(f, "ended"),
        }
    }
}

/// One question/answer/evaluation cycle.
///
/// A turn is open from the moment its question is asked until its evaluation
/// is recorded. Closed turns are never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    /// The level the question was asked at.
    pub difficulty: Difficulty,
    pub answer: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub asked_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Turn {
    fn open(question: String, difficulty: Difficulty) -> Self {
        Self {
            question,
            difficulty,
            answer: None,
            evaluation: None,
            asked_at: Utc::now(),
            answered_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.evaluation.is_none()
    }
}

/// The full state of one interview run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Set once the session is started.
    pub topic: Option<Topic>,
    pub difficulty: Difficulty,
    pub range: DifficultyRange,
    pub history: Vec<Turn>,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(range: DifficultyRange) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: None,
            difficulty: range.min(),
            range,
            history: Vec::new(),
            status: SessionStatus::NotStarted,
            started_at: None,
        }
    }

    /// The turn awaiting an answer, if any. Only the last turn can be open.
    pub fn open_turn(&self) -> Option<&Turn> {
        self.history.last().filter(|turn| turn.is_open())
    }

    /// Number of turns that have been answered and evaluated.
    pub fn answered_count(&self) -> usize {
        self.history.iter().filter(|turn| !turn.is_open()).count()
    }

    /// Number of questions asked so far, including an open one.
    pub fn questions_asked(&self) -> usize {
        self.history.len()
    }
}

/// Tunables for the interview loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterviewSettings {
    pub range: DifficultyRange,
    /// How many recent closed turns the interviewer sees.
    pub history_window: usize,
    /// End the session automatically after this many evaluated answers.
    pub max_questions: Option<usize>,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            range: DifficultyRange::default(),
            history_window: 3,
            max_questions: None,
        }
    }
}

/// What happened when an answer was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub evaluation: Evaluation,
    pub previous: Difficulty,
    pub current: Difficulty,
    /// True when a non-zero delta was cancelled by a range boundary.
    pub absorbed: bool,
    /// True when this answer exhausted the question budget.
    pub session_ended: bool,
}

impl TurnOutcome {
    pub fn level_changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Drives a single interview session against an `InterviewGenerator`.
pub struct InterviewController {
    generator: Arc<dyn InterviewGenerator>,
    settings: InterviewSettings,
    session: Session,
}

impl InterviewController {
    /// Creates a controller holding a fresh, unstarted session.
    ///
    /// # Arguments
    ///
    /// * `generator` - Produces questions and evaluates answers.
    /// * `settings` - Difficulty range, history window and question budget.
    pub fn new(generator: Arc<dyn InterviewGenerator>, settings: InterviewSettings) -> Self {
        Self {
            generator,
            session: Session::new(settings.range),
            settings,
        }
    }

    pub fn settings(&self) -> &InterviewSettings {
        &self.settings
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    /// Borrowed view of the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A read-only snapshot of the session for display.
    pub fn current_state(&self) -> Session {
        self.session.clone()
    }

    /// Starts the interview on `topic`, clamping the initial level into range.
    ///
    /// # Arguments
    ///
    /// * `topic` - The subject to interview on. Blank custom names are rejected.
    /// * `initial_difficulty` - The starting level, clamped into the configured range.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the session is in progress, or `InvalidState` if it was
    /// already started.
    #[instrument(skip(self), fields(session_id = %self.session.id))]
    pub fn start(&mut self, topic: Topic, initial_difficulty: Difficulty) -> Result<(), InterviewError> {
        self.require_status("start an interview", SessionStatus::NotStarted)?;
        if topic.name().trim().is_empty() {
            return Err(InterviewError::InvalidTopic);
        }

        let difficulty = self.settings.range.clamp(initial_difficulty);
        if difficulty != initial_difficulty {
            warn!(requested = %initial_difficulty, %difficulty, "Initial difficulty clamped into range");
        }

        info!(%topic, %difficulty, "Interview started");
        self.session.topic = Some(topic);
        self.session.difficulty = difficulty;
        self.session.status = SessionStatus::InProgress;
        self.session.started_at = Some(Utc::now());
        Ok(())
    }

    /// Asks the generator for the next question and opens a turn for it.
    #[instrument(skip(self), fields(session_id = %self.session.id, difficulty = %self.session.difficulty))]
    pub async fn ask_next_question(&mut self) -> Result<String, InterviewError> {
        let topic = self.in_progress_topic("ask a question")?;
        if self.session.open_turn().is_some() {
            return Err(self.invalid(
                "ask a question",
                "the current question has not been answered yet",
            ));
        }

        let history = &self.session.history;
        let window_start = history.len().saturating_sub(self.settings.history_window);
        let context = QuestionContext {
            topic,
            difficulty: self.session.difficulty,
            range: self.settings.range,
            recent_turns: history[window_start..].to_vec(),
        };

        let question = self
            .generator
            .generate_question(context)
            .await
            .map_err(InterviewError::generation)?;
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(InterviewError::Generation(
                "the generator returned an empty question".to_string(),
            ));
        }

        self.session
            .history
            .push(Turn::open(question.clone(), self.session.difficulty));
        info!(turn = self.session.history.len(), "Question asked");
        Ok(question)
    }

    /// Evaluates `answer` against the open question and closes the turn.
    ///
    /// On an evaluation failure the turn stays open and unanswered, so the
    /// same answer can be submitted again.
    #[instrument(skip(self, answer), fields(session_id = %self.session.id))]
    pub async fn submit_answer(&mut self, answer: &str) -> Result<TurnOutcome, InterviewError> {
        let topic = self.in_progress_topic("submit an answer")?;
        let Some(turn) = self.session.open_turn() else {
            return Err(self.invalid("submit an answer", "no question is awaiting an answer"));
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }

        let context = AnswerContext {
            topic,
            difficulty: self.session.difficulty,
            range: self.settings.range,
            question: turn.question.clone(),
            answer: answer.to_string(),
        };

        let mut evaluation = self
            .generator
            .evaluate_answer(context)
            .await
            .map_err(InterviewError::evaluation)?;
        evaluation.difficulty_delta = evaluation.difficulty_delta.clamp(-MAX_DELTA, MAX_DELTA);

        let previous = self.session.difficulty;
        let current = self.settings.range.apply(previous, evaluation.difficulty_delta);
        let absorbed = evaluation.difficulty_delta != 0 && previous == current;

        let turn = self
            .session
            .history
            .last_mut()
            .filter(|turn| turn.is_open())
            .ok_or_else(|| InterviewError::Evaluation("the open turn disappeared".to_string()))?;
        turn.answer = Some(answer.to_string());
        turn.evaluation = Some(evaluation.clone());
        turn.answered_at = Some(Utc::now());
        self.session.difficulty = current;

        info!(
            score = evaluation.score,
            correctness = %evaluation.correctness,
            %previous,
            %current,
            absorbed,
            "Answer evaluated"
        );

        let session_ended = self
            .settings
            .max_questions
            .is_some_and(|max| self.session.answered_count() >= max);
        if session_ended {
            info!(answered = self.session.answered_count(), "Question budget reached; interview ended");
            self.session.status = SessionStatus::Ended;
        }

        Ok(TurnOutcome {
            evaluation,
            previous,
            current,
            absorbed,
            session_ended,
        })
    }

    /// Ends the interview. Ending an already ended interview is a no-op.
    #[instrument(skip(self), fields(session_id = %self.session.id))]
    pub fn end(&mut self) -> Result<(), InterviewError> {
        match self.session.status {
            SessionStatus::NotStarted => {
                Err(self.invalid("end the interview", "no interview has been started"))
            }
            SessionStatus::Ended => Ok(()),
            SessionStatus::InProgress => {
                if self.session.open_turn().is_some() {
                    warn!("Interview ended with an unanswered question");
                }
                self.session.status = SessionStatus::Ended;
                info!(answered = self.session.answered_count(), "Interview ended");
                Ok(())
            }
        }
    }

    /// Discards the current session and prepares a fresh, unstarted one.
    pub fn reset(&mut self) {
        info!(previous_session = %self.session.id, "Interview reset");
        self.session = Session::new(self.settings.range);
    }

    fn in_progress_topic(&self, operation: &'static str) -> Result<Topic, InterviewError> {
        self.require_status(operation, SessionStatus::InProgress)?;
        self.session
            .topic
            .clone()
            .ok_or_else(|| self.invalid(operation, "the session has no topic"))
    }

    fn require_status(
        &self,
        operation: &'static str,
        expected: SessionStatus,
    ) -> Result<(), InterviewError> {
        if self.session.status == expected {
            return Ok(());
        }
        let reason = match self.session.status {
            SessionStatus::NotStarted => "no interview has been started",
            SessionStatus::InProgress => "an interview is already running; reset to begin a new one",
            SessionStatus::Ended => "the interview has ended; reset to begin a new one",
        };
        Err(self.invalid(operation, reason))
    }

    fn invalid(&self, operation: &'static str, reason: &'static str) -> InterviewError {
        InterviewError::InvalidState {
            operation,
            status: self.session.status,
            reason,
        }
    }
}
