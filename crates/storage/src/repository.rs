use async_trait::async_trait;
use quiz_core::model::{Question, QuestionDraft, QuestionError, QuestionId, QuizError, QuizMeta};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of the quiz metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizInfoRecord {
    pub title: String,
    pub people_attended: u32,
    pub rules: Vec<String>,
}

impl QuizInfoRecord {
    #[must_use]
    pub fn from_meta(meta: &QuizMeta) -> Self {
        Self {
            title: meta.title().to_owned(),
            people_attended: meta.people_attended(),
            rules: meta.rules().to_vec(),
        }
    }

    /// Convert the record into domain metadata.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the stored title is blank.
    pub fn into_meta(self) -> Result<QuizMeta, QuizError> {
        QuizMeta::new(self.title, self.people_attended, self.rules)
    }
}

/// Persisted shape of a question document.
///
/// Records are stored as-is; nothing guarantees `answer` is one of `options`
/// until [`QuestionRecord::into_question`] validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub position: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question, position: u32) -> Self {
        Self {
            id: question.id(),
            position,
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            answer: question.correct_answer().to_owned(),
        }
    }

    /// Validate the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the record does not describe an answerable question.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        QuestionDraft {
            prompt: self.prompt,
            options: self.options,
            correct_answer: self.answer,
        }
        .validate(self.id)
    }
}

/// Read and increment contract of a quiz document store.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Fetch the quiz metadata document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no quiz is stored, or other storage errors.
    async fn get_quiz_info(&self) -> Result<QuizInfoRecord, StorageError>;

    /// Fetch all question records ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be read.
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;

    /// Atomically add one to the attendance counter and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no quiz is stored, or other storage errors.
    async fn increment_attendance(&self) -> Result<u32, StorageError>;
}

/// Write side used to author and seed quizzes.
#[async_trait]
pub trait QuizAdminRepository: Send + Sync {
    /// Create or replace the quiz metadata document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn upsert_quiz_info(&self, info: &QuizInfoRecord) -> Result<(), StorageError>;

    /// Create or replace a question record, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_question(&self, question: &QuestionRecord) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    info: Arc<Mutex<Option<QuizInfoRecord>>>,
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_quiz_info(&self) -> Result<QuizInfoRecord, StorageError> {
        let guard = self
            .info
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clone().ok_or(StorageError::NotFound)
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records = guard.clone();
        records.sort_by_key(|r| r.position);
        Ok(records)
    }

    async fn increment_attendance(&self) -> Result<u32, StorageError> {
        let mut guard = self
            .info
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let info = guard.as_mut().ok_or(StorageError::NotFound)?;
        info.people_attended = info.people_attended.saturating_add(1);
        Ok(info.people_attended)
    }
}

#[async_trait]
impl QuizAdminRepository for InMemoryRepository {
    async fn upsert_quiz_info(&self, info: &QuizInfoRecord) -> Result<(), StorageError> {
        let mut guard = self
            .info
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(info.clone());
        Ok(())
    }

    async fn upsert_question(&self, question: &QuestionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|r| r.id == question.id) {
            Some(existing) => *existing = question.clone(),
            None => guard.push(question.clone()),
        }
        Ok(())
    }
}

/// Aggregates the quiz repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub admin: Arc<dyn QuizAdminRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let admin: Arc<dyn QuizAdminRepository> = Arc::new(repo);
        Self { quizzes, admin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(position: u32, answer: &str) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::random(),
            position,
            prompt: format!("Q{position}"),
            options: vec!["A".into(), "B".into()],
            answer: answer.into(),
        }
    }

    fn info() -> QuizInfoRecord {
        QuizInfoRecord {
            title: "Capitals".into(),
            people_attended: 3,
            rules: vec!["One answer per question".into()],
        }
    }

    #[tokio::test]
    async fn lists_questions_in_position_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(&record(2, "A")).await.unwrap();
        repo.upsert_question(&record(0, "B")).await.unwrap();
        repo.upsert_question(&record(1, "A")).await.unwrap();

        let positions: Vec<u32> = repo
            .list_questions()
            .await
            .unwrap()
            .iter()
            .map(|r| r.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn upsert_question_replaces_by_id() {
        let repo = InMemoryRepository::new();
        let mut q = record(0, "A");
        repo.upsert_question(&q).await.unwrap();
        q.prompt = "Edited".into();
        repo.upsert_question(&q).await.unwrap();

        let all = repo.list_questions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "Edited");
    }

    #[tokio::test]
    async fn increment_requires_quiz() {
        let repo = InMemoryRepository::new();
        let err = repo.increment_attendance().await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn increment_adds_exactly_one() {
        let repo = InMemoryRepository::new();
        repo.upsert_quiz_info(&info()).await.unwrap();
        assert_eq!(repo.increment_attendance().await.unwrap(), 4);
        assert_eq!(repo.get_quiz_info().await.unwrap().people_attended, 4);
    }

    #[test]
    fn record_with_foreign_answer_fails_validation() {
        let err = record(0, "Z").into_question().unwrap_err();
        assert!(matches!(err, QuestionError::AnswerNotInOptions { .. }));
    }

    #[tokio::test]
    async fn in_memory_storage_shares_one_store() {
        let storage = Storage::in_memory();
        storage.admin.upsert_quiz_info(&info()).await.unwrap();
        storage.admin.upsert_question(&record(0, "B")).await.unwrap();

        assert_eq!(storage.quizzes.get_quiz_info().await.unwrap().title, "Capitals");
        assert_eq!(storage.quizzes.list_questions().await.unwrap().len(), 1);
        assert_eq!(storage.quizzes.increment_attendance().await.unwrap(), 4);
    }
}
