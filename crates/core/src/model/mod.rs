mod ids;
mod question;
mod quiz;
mod score;

pub use ids::{ParseIdError, QuestionId};
pub use question::{Question, QuestionDraft, QuestionError};
pub use quiz::{QuizError, QuizMeta};
pub use score::{ScoreCard, ScoreCardError};
