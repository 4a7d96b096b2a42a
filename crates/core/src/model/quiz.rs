use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,
}

/// Quiz metadata shown before a session starts.
///
/// Everything except `people_attended` is fixed once fetched. The attendance
/// count only moves through [`QuizMeta::record_attendance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuizMetaDocument")]
pub struct QuizMeta {
    title: String,
    people_attended: u32,
    rules: Vec<String>,
}

/// Wire shape of [`QuizMeta`]; deserialization goes through [`QuizMeta::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizMetaDocument {
    title: String,
    people_attended: u32,
    #[serde(default)]
    rules: Vec<String>,
}

impl TryFrom<QuizMetaDocument> for QuizMeta {
    type Error = QuizError;

    fn try_from(doc: QuizMetaDocument) -> Result<Self, Self::Error> {
        Self::new(doc.title, doc.people_attended, doc.rules)
    }
}

impl QuizMeta {
    /// Build quiz metadata.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank.
    pub fn new(
        title: impl Into<String>,
        people_attended: u32,
        rules: Vec<String>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        Ok(Self {
            title,
            people_attended,
            rules,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn people_attended(&self) -> u32 {
        self.people_attended
    }

    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Count one more completed session.
    pub fn record_attendance(&mut self) {
        self.people_attended = self.people_attended.saturating_add(1);
    }
}
