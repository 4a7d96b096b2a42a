use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer at least one option")]
    NoOptions,

    #[error("option {option:?} appears more than once")]
    DuplicateOption { option: String },

    #[error("correct answer {answer:?} is not one of the options")]
    AnswerNotInOptions { answer: String },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
        }
    }

    /// Validate the draft and attach an identity.
    ///
    /// Option text is compared exactly; an empty string is a legal option.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no options,
    /// an option repeats, or the correct answer is not among the options.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[..i].contains(option) {
                return Err(QuestionError::DuplicateOption {
                    option: option.clone(),
                });
            }
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(QuestionError::AnswerNotInOptions {
                answer: self.correct_answer,
            });
        }

        Ok(Question {
            id,
            prompt: self.prompt,
            options: self.options,
            correct_answer: self.correct_answer,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// The correct answer is guaranteed to be one of `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }

    /// Reorder options using the given permutation source.
    ///
    /// The correct answer stays attached to its text, so validity is preserved.
    pub fn reorder_options(&mut self, reorder: impl FnOnce(&mut [String])) {
        reorder(&mut self.options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str], answer: &str) -> QuestionDraft {
        QuestionDraft::new("Capital of France?", options.iter().copied(), answer)
    }

    #[test]
    fn validates_well_formed_question() {
        let question = draft(&["Paris", "Rome"], "Paris")
            .validate(QuestionId::random())
            .unwrap();
        assert_eq!(question.options().len(), 2);
        assert!(question.is_correct("Paris"));
        assert!(!question.is_correct("Rome"));
    }

    #[test]
    fn rejects_answer_outside_options() {
        let err = draft(&["Paris", "Rome"], "Berlin")
            .validate(QuestionId::random())
            .unwrap_err();
        assert_eq!(
            err,
            QuestionError::AnswerNotInOptions {
                answer: "Berlin".into()
            }
        );
    }

    #[test]
    fn rejects_duplicate_options() {
        let err = draft(&["Paris", "Paris"], "Paris")
            .validate(QuestionId::random())
            .unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn rejects_empty_options() {
        let err = draft(&[], "Paris")
            .validate(QuestionId::random())
            .unwrap_err();
        assert_eq!(err, QuestionError::NoOptions);
    }

    #[test]
    fn rejects_blank_prompt() {
        let err = QuestionDraft::new("   ", ["Paris", "Rome"], "Paris")
            .validate(QuestionId::random())
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn empty_option_text_is_a_legal_answer() {
        let question = draft(&["", "Rome"], "")
            .validate(QuestionId::random())
            .unwrap();
        assert!(question.is_correct(""));
        assert!(question.has_option(""));
    }

    #[test]
    fn reorder_keeps_correct_answer() {
        let mut question = draft(&["Paris", "Rome", "Oslo"], "Paris")
            .validate(QuestionId::random())
            .unwrap();
        question.reorder_options(<[String]>::reverse);
        assert_eq!(question.options()[2], "Paris");
        assert_eq!(question.correct_answer(), "Paris");
    }
}
