#![forbid(unsafe_code)]

pub mod error;
pub mod gateway;
pub mod remote_store;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{FetchError, SessionError};
pub use gateway::{QuizBundle, QuizGateway, QuizOverview};
pub use remote_store::{RemoteQuizStore, RemoteStoreConfig};

pub use sessions::{
    Advance, AnswerOutcome, FinishedQuiz, OptionState, QuizLoopService, QuizSession,
    SessionProgress, SessionState,
};
