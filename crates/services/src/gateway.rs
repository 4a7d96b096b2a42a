use std::sync::Arc;

use log::{debug, warn};
use quiz_core::model::{Question, QuizMeta};
use storage::repository::{QuizRepository, StorageError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::FetchError;

/// Quiz metadata and its validated questions, fetched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizBundle {
    pub meta: QuizMeta,
    pub questions: Vec<Question>,
}

/// Pre-start summary of a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOverview {
    pub title: String,
    pub question_count: usize,
    pub people_attended: u32,
    pub rules: Vec<String>,
}

impl QuizBundle {
    #[must_use]
    pub fn overview(&self) -> QuizOverview {
        QuizOverview {
            title: self.meta.title().to_owned(),
            question_count: self.questions.len(),
            people_attended: self.meta.people_attended(),
            rules: self.meta.rules().to_vec(),
        }
    }
}

/// Reads quizzes from a store and commits attendance back to it.
///
/// Background commits run on the runtime captured at construction, so they can
/// be started from threads that are not inside that runtime.
#[derive(Clone)]
pub struct QuizGateway {
    store: Arc<dyn QuizRepository>,
    runtime: Handle,
}

impl QuizGateway {
    #[must_use]
    pub fn new(store: Arc<dyn QuizRepository>, runtime: Handle) -> Self {
        Self { store, runtime }
    }

    /// Build a gateway on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn on_current_runtime(store: Arc<dyn QuizRepository>) -> Self {
        Self::new(store, Handle::current())
    }

    /// Fetch the quiz metadata and every question, validating each record.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Storage` if either read fails, `FetchError::InvalidQuiz`
    /// for bad metadata, and `FetchError::Validation` for the first question
    /// record that is not answerable.
    pub async fn fetch_quiz(&self) -> Result<QuizBundle, FetchError> {
        let info = self.store.get_quiz_info().await?;
        let records = self.store.list_questions().await?;

        let meta = info.into_meta()?;
        let questions = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                record
                    .into_question()
                    .map_err(|source| FetchError::Validation { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "fetched quiz {:?} with {} questions",
            meta.title(),
            questions.len()
        );
        Ok(QuizBundle { meta, questions })
    }

    /// Increment the remote attendance counter and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the increment fails.
    pub async fn commit_attendance(&self) -> Result<u32, StorageError> {
        self.store.increment_attendance().await
    }

    /// Increment the attendance counter in the background.
    ///
    /// Failures are logged and dropped. Callable from any thread.
    pub fn spawn_commit_attendance(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        self.runtime.spawn(async move {
            match store.increment_attendance().await {
                Ok(total) => debug!("attendance committed, now {total}"),
                Err(err) => warn!("failed to commit attendance: {err}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use storage::repository::{
        InMemoryRepository, QuestionRecord, QuizAdminRepository, QuizInfoRecord,
    };

    async fn seeded(answers: &[&str]) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.upsert_quiz_info(&QuizInfoRecord {
            title: "Colors".into(),
            people_attended: 5,
            rules: vec!["Be quick".into()],
        })
        .await
        .unwrap();
        for (position, answer) in (0_u32..).zip(answers) {
            repo.upsert_question(&QuestionRecord {
                id: QuestionId::random(),
                position,
                prompt: format!("Q{position}"),
                options: vec!["Red".into(), "Blue".into()],
                answer: (*answer).to_string(),
            })
            .await
            .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn fetch_returns_meta_and_questions_together() {
        let repo = seeded(&["Red", "Blue"]).await;
        let gateway = QuizGateway::on_current_runtime(Arc::new(repo));

        let bundle = gateway.fetch_quiz().await.unwrap();
        let overview = bundle.overview();
        assert_eq!(overview.title, "Colors");
        assert_eq!(overview.question_count, 2);
        assert_eq!(overview.people_attended, 5);
        assert_eq!(overview.rules, vec!["Be quick".to_string()]);
    }

    #[tokio::test]
    async fn fetch_rejects_unanswerable_question() {
        let repo = seeded(&["Red", "Green"]).await;
        let gateway = QuizGateway::on_current_runtime(Arc::new(repo));

        let err = gateway.fetch_quiz().await.unwrap_err();
        assert!(matches!(err, FetchError::Validation { position: 1, .. }));
    }

    #[tokio::test]
    async fn fetch_without_quiz_is_storage_error() {
        let gateway = QuizGateway::on_current_runtime(Arc::new(InMemoryRepository::new()));
        let err = gateway.fetch_quiz().await.unwrap_err();
        assert!(matches!(err, FetchError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn awaited_commit_returns_new_count() {
        let repo = seeded(&["Red"]).await;
        let gateway = QuizGateway::on_current_runtime(Arc::new(repo.clone()));

        assert_eq!(gateway.commit_attendance().await.unwrap(), 6);
        assert_eq!(gateway.commit_attendance().await.unwrap(), 7);
        assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 7);
    }

    #[tokio::test]
    async fn awaited_commit_surfaces_storage_errors() {
        let gateway = QuizGateway::on_current_runtime(Arc::new(InMemoryRepository::new()));
        assert!(matches!(
            gateway.commit_attendance().await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn spawned_commit_increments_once() {
        let repo = seeded(&["Red"]).await;
        let gateway = QuizGateway::on_current_runtime(Arc::new(repo.clone()));

        gateway.spawn_commit_attendance().await.unwrap();

        assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 6);
    }

    #[tokio::test]
    async fn spawned_commit_swallows_failures() {
        let gateway = QuizGateway::on_current_runtime(Arc::new(InMemoryRepository::new()));
        assert!(gateway.spawn_commit_attendance().await.is_ok());
    }

    #[test]
    fn spawn_from_plain_thread_uses_captured_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let repo = runtime.block_on(seeded(&["Red"]));
        let gateway = QuizGateway::new(Arc::new(repo.clone()), runtime.handle().clone());

        let handle = gateway.spawn_commit_attendance();
        runtime.block_on(handle).unwrap();

        let info = runtime.block_on(repo.get_quiz_info()).unwrap();
        assert_eq!(info.people_attended, 6);
    }
}
