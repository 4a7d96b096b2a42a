use log::debug;
use quiz_core::model::{QuizMeta, ScoreCard};
use rand::seq::SliceRandom;
use tokio::task::JoinHandle;

use super::service::QuizSession;
use crate::Clock;
use crate::error::{FetchError, SessionError};
use crate::gateway::{QuizBundle, QuizGateway};

/// Outcome of finishing a session through `QuizLoopService`.
#[derive(Debug)]
pub struct FinishedQuiz {
    pub score_card: ScoreCard,
    /// Background attendance commit. Dropping the handle does not cancel it.
    pub commit: JoinHandle<()>,
}

/// Orchestrates fetching, starting, finishing, and abandoning quiz sessions.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    gateway: QuizGateway,
    shuffle_options: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, gateway: QuizGateway) -> Self {
        Self {
            clock,
            gateway,
            shuffle_options: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_options(mut self, shuffle_options: bool) -> Self {
        self.shuffle_options = shuffle_options;
        self
    }

    /// Fetch the quiz and its questions.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the store cannot be read or a record is invalid.
    pub async fn load_quiz(&self) -> Result<QuizBundle, FetchError> {
        self.gateway.fetch_quiz().await
    }

    /// Start a session over a copy of the bundle's questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the quiz has no questions.
    pub fn start_session(&self, bundle: &QuizBundle) -> Result<QuizSession, SessionError> {
        let mut questions = bundle.questions.clone();
        if self.shuffle_options {
            let mut rng = rand::rng();
            for question in &mut questions {
                question.reorder_options(|options| options.shuffle(&mut rng));
            }
        }
        let session = QuizSession::new(questions, self.clock.now())?;
        debug!(
            "started session over {} questions",
            session.total_questions()
        );
        Ok(session)
    }

    /// Fetch the quiz and start a session in one step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` on fetch failures and `SessionError::Empty`
    /// if the quiz has no questions. No session exists after an error.
    pub async fn fetch_and_start(&self) -> Result<(QuizBundle, QuizSession), SessionError> {
        let bundle = self.load_quiz().await?;
        let session = self.start_session(&bundle)?;
        Ok((bundle, session))
    }

    /// Finish the session, count the attendance locally, and commit it remotely.
    ///
    /// The remote commit runs in the background; its failure is logged and does
    /// not affect the returned score card. A second call fails with
    /// `SessionError::Completed`, so exactly one commit is started per completed session.
    ///
    /// # Errors
    ///
    /// Returns the `SessionError` from [`QuizSession::finish`].
    pub fn finish(
        &self,
        session: &mut QuizSession,
        meta: &mut QuizMeta,
    ) -> Result<FinishedQuiz, SessionError> {
        let score_card = session.finish(self.clock.now())?;
        meta.record_attendance();
        debug!(
            "session finished with {}/{} ({})",
            score_card.score(),
            score_card.total(),
            score_card.percent_label()
        );
        let commit = self.gateway.spawn_commit_attendance();
        Ok(FinishedQuiz { score_card, commit })
    }

    /// Drop an unfinished session. Nothing is written to the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already finished.
    pub fn abandon(&self, session: QuizSession) -> Result<(), SessionError> {
        let answered = session.answered_count();
        let total = session.total_questions();
        session.abandon()?;
        debug!("session abandoned after {answered}/{total} answers");
        Ok(())
    }
}
