//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuizError, ScoreCardError};
use storage::repository::StorageError;

/// Errors emitted while fetching a quiz through `QuizGateway`.
///
/// A failed fetch never yields partial data: no metadata and no questions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid quiz metadata: {0}")]
    InvalidQuiz(#[from] QuizError),
    #[error("question at position {position} is invalid: {source}")]
    Validation {
        position: usize,
        #[source]
        source: QuestionError,
    },
}

/// Errors emitted by the quiz session state machine and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("current question has not been answered")]
    Unanswered,
    #[error("session can only finish on an answered last question")]
    NotReadyToFinish,
    #[error("{option:?} is not an option of the current question")]
    UnknownOption { option: String },
    #[error(transparent)]
    ScoreCard(#[from] ScoreCardError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
