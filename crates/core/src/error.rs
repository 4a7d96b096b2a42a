use thiserror::Error;

use crate::model::{QuestionError, QuizError, ScoreCardError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    ScoreCard(#[from] ScoreCardError),
}
