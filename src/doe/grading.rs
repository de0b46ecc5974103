//! Checking student-entered answers against computed values.

use super::types::{AnswerFeedback, AnswerKind};

/// Default absolute tolerance for an answer to count as correct.
pub const DEFAULT_ANSWER_TOLERANCE: f64 = 0.1;

/// Compare a submitted value with the computed one.
///
/// The answer is correct when `|submitted − expected| < tolerance`. A
/// non-finite submission is never correct.
#[must_use]
pub fn check_answer(
    kind: AnswerKind,
    submitted: f64,
    expected: f64,
    tolerance: f64,
) -> AnswerFeedback {
    let deviation = (submitted - expected).abs();
    AnswerFeedback {
        kind,
        submitted,
        expected,
        deviation,
        correct: deviation.is_finite() && deviation < tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance() {
        let feedback = check_answer(AnswerKind::Mean, 11.05, 11.0, DEFAULT_ANSWER_TOLERANCE);
        assert!(feedback.correct);
        assert!((feedback.deviation - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_outside_tolerance() {
        let feedback = check_answer(AnswerKind::Effect, -1.0, 1.0, DEFAULT_ANSWER_TOLERANCE);
        assert!(!feedback.correct);
        assert_eq!(feedback.kind, AnswerKind::Effect);
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let feedback = check_answer(AnswerKind::StdDev, 1.5, 1.0, 0.5);
        assert!(!feedback.correct);
    }

    #[test]
    fn test_nan_submission() {
        let feedback = check_answer(AnswerKind::Mean, f64::NAN, 1.0, DEFAULT_ANSWER_TOLERANCE);
        assert!(!feedback.correct);
    }
}
