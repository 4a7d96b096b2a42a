/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// `current_index / (total - 1)`, or 0 for a single question.
    pub fraction: f64,
    pub is_complete: bool,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn progress_fraction(index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 0.0;
    }
    index as f64 / (total - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_question_is_pinned_at_zero() {
        assert!(progress_fraction(0, 1).abs() < f64::EPSILON);
    }

    #[test]
    fn last_index_is_one() {
        assert!((progress_fraction(3, 4) - 1.0).abs() < f64::EPSILON);
        assert!((progress_fraction(1, 3) - 0.5).abs() < f64::EPSILON);
    }
}
