//! Quiz answer evaluation
//!
//! Pure: takes the stored questions and the submitted option indices and
//! decides. Recording a pass against the session is the caller's job.

use serde::Serialize;

use crate::db::schemas::QuestionDoc;
use crate::types::{BookwormError, Result};

/// Outcome of a complete quiz submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub passed: bool,
    pub reason: String,
}

impl Evaluation {
    fn pass() -> Self {
        Self {
            passed: true,
            reason: "All answers are correct".into(),
        }
    }

    fn fail() -> Self {
        Self {
            passed: false,
            reason: "One or more answers are incorrect".into(),
        }
    }
}

/// Check `submitted` against `questions`, position by position.
///
/// All-or-nothing: passes only when every submitted index equals the stored
/// correct option at the same position. `submitted` must follow the order in
/// which the questions were returned.
pub fn evaluate(book_id: i64, questions: &[QuestionDoc], submitted: &[i32]) -> Result<Evaluation> {
    if questions.is_empty() {
        return Err(BookwormError::NoQuizConfigured(book_id));
    }

    if submitted.len() != questions.len() {
        return Err(BookwormError::IncompleteAnswers {
            expected: questions.len(),
            got: submitted.len(),
        });
    }

    let all_correct = questions
        .iter()
        .zip(submitted)
        .all(|(question, answer)| question.correct_option == *answer);

    Ok(if all_correct {
        Evaluation::pass()
    } else {
        Evaluation::fail()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(correct: &[i32]) -> Vec<QuestionDoc> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &correct_option)| QuestionDoc {
                id: i as i64 + 1,
                book_id: 1,
                question: format!("Question {}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_reference_scenario() {
        let questions = quiz(&[1, 0, 2]);

        assert!(evaluate(1, &questions, &[1, 0, 2]).unwrap().passed);
        assert!(!evaluate(1, &questions, &[1, 0, 1]).unwrap().passed);
        assert!(matches!(
            evaluate(1, &questions, &[1, 0]),
            Err(BookwormError::IncompleteAnswers { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_any_single_wrong_answer_fails() {
        let correct = [3, 1, 0, 2];
        let questions = quiz(&correct);
        assert!(evaluate(1, &questions, &correct).unwrap().passed);

        for position in 0..correct.len() {
            for wrong in 0..4 {
                if wrong == correct[position] {
                    continue;
                }
                let mut answers = correct.to_vec();
                answers[position] = wrong;
                assert!(
                    !evaluate(1, &questions, &answers).unwrap().passed,
                    "position {} answer {} should fail",
                    position,
                    wrong
                );
            }
        }
    }

    #[test]
    fn test_order_matters() {
        let questions = quiz(&[0, 1, 2]);
        assert!(!evaluate(1, &questions, &[2, 1, 0]).unwrap().passed);
    }

    #[test]
    fn test_too_many_answers_is_incomplete() {
        let questions = quiz(&[0, 1]);
        assert!(matches!(
            evaluate(1, &questions, &[0, 1, 2]),
            Err(BookwormError::IncompleteAnswers { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_out_of_range_answer_is_just_wrong() {
        let questions = quiz(&[0]);
        assert!(!evaluate(1, &questions, &[-1]).unwrap().passed);
        assert!(!evaluate(1, &questions, &[99]).unwrap().passed);
    }

    #[test]
    fn test_no_quiz_configured() {
        assert!(matches!(
            evaluate(9, &[], &[]),
            Err(BookwormError::NoQuizConfigured(9))
        ));
    }
}
