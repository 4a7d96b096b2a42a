use chrono::{DateTime, Utc};
use quiz_core::model::{Question, ScoreCard};
use std::fmt;

use super::progress::{SessionProgress, progress_fraction};
use crate::error::SessionError;

//
// ─── STATES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Where a session stands in its traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress { index: usize },
    /// The last question is answered and `advance` was requested.
    ReadyToFinish,
    Completed,
}

/// Result of `select_answer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// The question already had a selection; nothing changed.
    AlreadyAnswered,
}

/// Result of `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    ReadyToFinish,
}

/// Feedback for one option of the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    Correct,
    Incorrect,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a fixed, ordered list of questions.
///
/// Each question accepts a single selection. The score only moves when that
/// selection matches the correct answer, so `score <= total` always holds.
pub struct QuizSession {
    questions: Vec<Question>,
    selections: Vec<Option<String>>,
    current: usize,
    score: u32,
    state: SessionState,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let selections = vec![None; questions.len()];
        Ok(Self {
            questions,
            selections,
            current: 0,
            score: 0,
            state: SessionState::InProgress { index: 0 },
            started_at,
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// Selection made for the current question, if any.
    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.selections[self.current].as_deref()
    }

    /// Number of questions that have a selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Completed)
    }

    /// Whether the primary action ("next" or "finish") is currently allowed.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        !self.is_complete() && self.selected_answer().is_some()
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        progress_fraction(self.current, self.questions.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.current + 1,
            total: self.total_questions(),
            answered: self.answered_count(),
            fraction: self.progress_fraction(),
            is_complete: self.is_complete(),
        }
    }

    /// Feedback for every option of the current question, in display order.
    ///
    /// Before a selection everything is `Neutral`. Afterwards the correct option
    /// is `Correct` and a wrong selection is `Incorrect`.
    #[must_use]
    pub fn option_states(&self) -> Vec<(&str, OptionState)> {
        let question = self.current_question();
        let selected = self.selected_answer();
        question
            .options()
            .iter()
            .map(|option| {
                let state = match selected {
                    None => OptionState::Neutral,
                    Some(_) if question.is_correct(option) => OptionState::Correct,
                    Some(choice) if choice == option.as_str() => OptionState::Incorrect,
                    Some(_) => OptionState::Neutral,
                };
                (option.as_str(), state)
            })
            .collect()
    }

    /// Record an answer for the current question.
    ///
    /// Only the first selection per question counts; later calls return
    /// `AnswerOutcome::AlreadyAnswered` and leave the session untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is finished and
    /// `SessionError::UnknownOption` if `option` is not offered by the question.
    pub fn select_answer(&mut self, option: &str) -> Result<AnswerOutcome, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.selections[self.current].is_some() {
            return Ok(AnswerOutcome::AlreadyAnswered);
        }

        let question = &self.questions[self.current];
        if !question.has_option(option) {
            return Err(SessionError::UnknownOption {
                option: option.to_owned(),
            });
        }

        let correct = question.is_correct(option);
        self.selections[self.current] = Some(option.to_owned());
        if correct {
            self.score = self.score.saturating_add(1);
            Ok(AnswerOutcome::Correct)
        } else {
            Ok(AnswerOutcome::Incorrect)
        }
    }

    /// Move past the current, answered question.
    ///
    /// On the last question this enters `ReadyToFinish` instead of moving on.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unanswered` if the current question has no
    /// selection and `SessionError::Completed` once the session is finished.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.selected_answer().is_none() {
            return Err(SessionError::Unanswered);
        }

        if self.is_last() {
            self.state = SessionState::ReadyToFinish;
            return Ok(Advance::ReadyToFinish);
        }

        self.current += 1;
        self.state = SessionState::InProgress {
            index: self.current,
        };
        Ok(Advance::Next {
            index: self.current,
        })
    }

    /// Complete the session and produce its score card.
    ///
    /// `completed_at` should come from the services layer clock. A timestamp
    /// earlier than the start (wall clock stepped back) is clamped to the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReadyToFinish` unless the last question is
    /// current and answered, and `SessionError::Completed` if already finished.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<ScoreCard, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if !self.is_last() || self.selected_answer().is_none() {
            return Err(SessionError::NotReadyToFinish);
        }

        let card = ScoreCard::from_len(
            self.score,
            self.questions.len(),
            self.started_at,
            completed_at.max(self.started_at),
        )?;
        self.state = SessionState::Completed;
        Ok(card)
    }

    /// Discard an unfinished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already finished.
    pub fn abandon(self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
