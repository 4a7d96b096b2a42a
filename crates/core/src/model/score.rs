use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreCardError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("a score card needs at least one question")]
    NoQuestions,

    #[error("score ({score}) exceeds question count ({total})")]
    ScoreOutOfRange { score: u32, total: u32 },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

/// Result of a completed quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    score: u32,
    total: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl ScoreCard {
    /// Build a score card.
    ///
    /// # Errors
    ///
    /// Returns `ScoreCardError` if the time range is inverted, `total` is zero,
    /// or `score` exceeds `total`.
    pub fn new(
        score: u32,
        total: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreCardError> {
        if completed_at < started_at {
            return Err(ScoreCardError::InvalidTimeRange);
        }
        if total == 0 {
            return Err(ScoreCardError::NoQuestions);
        }
        if score > total {
            return Err(ScoreCardError::ScoreOutOfRange { score, total });
        }
        Ok(Self {
            score,
            total,
            started_at,
            completed_at,
        })
    }

    /// Build a score card from a question count expressed as `usize`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreCardError::TooManyQuestions` if `len` does not fit in `u32`,
    /// otherwise the same errors as [`ScoreCard::new`].
    pub fn from_len(
        score: u32,
        len: usize,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreCardError> {
        let total =
            u32::try_from(len).map_err(|_| ScoreCardError::TooManyQuestions { len })?;
        Self::new(score, total, started_at, completed_at)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Share of correct answers in `[0, 100]`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total) * 100.0
    }

    /// Percentage rounded to a whole number, e.g. `"67%"`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.0}%", self.percent())
    }
}
