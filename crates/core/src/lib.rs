pub mod difficulty;
pub mod error;
pub mod evaluation;
pub mod generator;
pub mod llm_client;
pub mod ollama;
pub mod prompts;
pub mod session;
pub mod topic;

pub use difficulty::{Difficulty, DifficultyRange};
pub use error::InterviewError;
pub use evaluation::{Correctness, Evaluation, Feedback};
pub use generator::{CannedInterviewGenerator, InterviewGenerator, LLMInterviewGenerator};
pub use session::{InterviewController, InterviewSettings, Session, SessionStatus, Turn, TurnOutcome};
pub use topic::Topic;
