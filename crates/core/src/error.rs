//! Error types surfaced by the interview controller.

use thiserror::Error;

use crate::session::SessionStatus;

/// Errors returned by `InterviewController` operations.
///
/// Generation and evaluation failures are runtime conditions the caller may
/// retry. `InvalidState` means an operation was called out of sequence; the
/// session is left untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("failed to generate the next question: {0}")]
    Generation(String),
    #[error("failed to evaluate the answer: {0}")]
    Evaluation(String),
    #[error("cannot {operation} while the interview is {status}: {reason}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
        reason: &'static str,
    },
    #[error("interview topic must not be empty")]
    InvalidTopic,
    #[error("answer must not be empty")]
    EmptyAnswer,
}

impl InterviewError {
    pub(crate) fn generation(err: anyhow::Error) -> Self {
        Self::Generation(format!("{err:#}"))
    }

    pub(crate) fn evaluation(err: anyhow::Error) -> Self {
        Self::Evaluation(format!("{err:#}"))
    }

    /// True for failures of the generator collaborator, which a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generation(_) | Self::Evaluation(_))
    }
}
