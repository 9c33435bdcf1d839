//! Proof-of-reading quizzes
//!
//! Each book carries a short ordered list of multiple-choice questions.
//! Readers only ever see [`PublicQuestion`]s; the correct option stays on the
//! server and is read back solely by the evaluator and the admin console.
//!
//! Replacing a book's quiz is delete-then-insert, not a merge.

pub mod evaluator;

pub use evaluator::{evaluate, Evaluation};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::schemas::{BookDoc, Metadata, QuestionDoc};
use crate::db::CatalogStore;
use crate::session::SessionStore;
use crate::types::{BookwormError, Result};

/// Number of options every question must offer
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A question as readers see it: no answer attached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub book_id: i64,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&QuestionDoc> for PublicQuestion {
    fn from(doc: &QuestionDoc) -> Self {
        Self {
            id: doc.id,
            book_id: doc.book_id,
            question: doc.question.clone(),
            options: doc.options.clone(),
        }
    }
}

/// A question with its answer, for administrators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub id: i64,
    pub book_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: i32,
}

impl From<&QuestionDoc> for AnsweredQuestion {
    fn from(doc: &QuestionDoc) -> Self {
        Self {
            id: doc.id,
            book_id: doc.book_id,
            question: doc.question.clone(),
            options: doc.options.clone(),
            correct_option: doc.correct_option,
        }
    }
}

/// Admin-supplied question content
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: i32,
}

impl QuestionInput {
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(BookwormError::Validation("Question text is required".into()));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(BookwormError::Validation(format!(
                "A question needs exactly {} options, got {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            )));
        }
        if self.options.iter().any(|option| option.trim().is_empty()) {
            return Err(BookwormError::Validation("Options must not be empty".into()));
        }
        if self.correct_option < 0 || self.correct_option as usize >= self.options.len() {
            return Err(BookwormError::Validation(format!(
                "correctOption must be between 0 and {}",
                self.options.len() - 1
            )));
        }
        Ok(())
    }

    fn into_doc(self, book_id: i64) -> QuestionDoc {
        QuestionDoc {
            _id: None,
            metadata: Metadata::new(),
            id: 0,
            book_id,
            question: self.question.trim().to_string(),
            options: self.options.into_iter().map(|o| o.trim().to_string()).collect(),
            correct_option: self.correct_option,
        }
    }
}

/// Quiz storage and retrieval
#[derive(Clone)]
pub struct QuizStore {
    store: Arc<dyn CatalogStore>,
}

impl QuizStore {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    async fn require_book(&self, book_id: i64) -> Result<BookDoc> {
        self.store
            .get_book(book_id)
            .await?
            .ok_or_else(|| BookwormError::NotFound(format!("Book {}", book_id)))
    }

    /// Questions for a book without their answers. Empty when no quiz is set.
    pub async fn get_questions(&self, book_id: i64) -> Result<Vec<PublicQuestion>> {
        self.require_book(book_id).await?;
        let questions = self.store.list_questions(book_id).await?;
        Ok(questions.iter().map(PublicQuestion::from).collect())
    }

    /// Questions with their answers, in evaluation order
    pub async fn get_questions_with_answers(&self, book_id: i64) -> Result<Vec<QuestionDoc>> {
        self.require_book(book_id).await?;
        self.store.list_questions(book_id).await
    }

    pub async fn create_question(&self, book_id: i64, input: QuestionInput) -> Result<QuestionDoc> {
        input.validate()?;
        self.require_book(book_id).await?;

        let question = self.store.insert_question(input.into_doc(book_id)).await?;
        info!("Created question {} for book {}", question.id, book_id);
        Ok(question)
    }

    /// Discard every question of the book and store `inputs` in their place.
    ///
    /// All inputs are validated before anything is deleted.
    pub async fn replace_all_questions(
        &self,
        book_id: i64,
        inputs: Vec<QuestionInput>,
    ) -> Result<Vec<QuestionDoc>> {
        for input in &inputs {
            input.validate()?;
        }
        self.require_book(book_id).await?;

        let removed = self.store.delete_questions_for_book(book_id).await?;

        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            created.push(self.store.insert_question(input.into_doc(book_id)).await?);
        }

        info!(
            "Replaced quiz for book {}: removed {}, created {}",
            book_id,
            removed,
            created.len()
        );
        Ok(created)
    }

    pub async fn update_question(&self, question_id: i64, input: QuestionInput) -> Result<QuestionDoc> {
        input.validate()?;

        let existing = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| BookwormError::NotFound(format!("Question {}", question_id)))?;

        let mut updated = input.into_doc(existing.book_id);
        updated._id = existing._id;
        updated.id = existing.id;
        updated.metadata = existing.metadata;

        if !self.store.update_question(&updated).await? {
            return Err(BookwormError::NotFound(format!("Question {}", question_id)));
        }
        Ok(updated)
    }

    pub async fn delete_question(&self, question_id: i64) -> Result<()> {
        if self.store.delete_question(question_id).await? {
            info!("Deleted question {}", question_id);
            Ok(())
        } else {
            Err(BookwormError::NotFound(format!("Question {}", question_id)))
        }
    }

    /// Evaluate a submission and, on a pass, record the book as verified for
    /// the session. A failed attempt leaves earlier verification untouched.
    pub async fn verify(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        book_id: i64,
        answers: &[i32],
    ) -> Result<Evaluation> {
        let questions = self.get_questions_with_answers(book_id).await?;
        let evaluation = evaluate(book_id, &questions, answers)?;

        if evaluation.passed {
            sessions.mark_verified(session_id, book_id)?;
            info!("Session verified for book {}", book_id);
        } else {
            debug!("Quiz attempt for book {} failed", book_id);
        }
        Ok(evaluation)
    }

    /// Remove the whole quiz; the book then needs no verification
    pub async fn delete_all_questions(&self, book_id: i64) -> Result<u64> {
        self.require_book(book_id).await?;
        let removed = self.store.delete_questions_for_book(book_id).await?;
        info!("Deleted {} questions for book {}", removed, book_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCatalogStore;

    fn input(text: &str, correct_option: i32) -> QuestionInput {
        QuestionInput {
            question: text.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option,
        }
    }

    async fn setup() -> (QuizStore, i64) {
        let store: Arc<dyn CatalogStore> = Arc::new(MemoryCatalogStore::new());
        let book = store
            .insert_book(BookDoc {
                title: "Moby-Dick".into(),
                author: "Herman Melville".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (QuizStore::new(store), book.id)
    }

    #[tokio::test]
    async fn test_public_questions_hide_answers() {
        let (quiz, book_id) = setup().await;
        quiz.create_question(book_id, input("Captain?", 2)).await.unwrap();

        let public = quiz.get_questions(book_id).await.unwrap();
        assert_eq!(public.len(), 1);

        let json = serde_json::to_value(&public).unwrap();
        let text = json.to_string();
        assert!(!text.contains("correct"));
        assert!(json[0].get("options").is_some());
    }

    #[tokio::test]
    async fn test_empty_quiz_is_empty_list() {
        let (quiz, book_id) = setup().await;
        assert!(quiz.get_questions(book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_book_is_not_found() {
        let (quiz, _) = setup().await;
        assert!(matches!(
            quiz.get_questions(404).await,
            Err(BookwormError::NotFound(_))
        ));
        assert!(matches!(
            quiz.create_question(404, input("q", 0)).await,
            Err(BookwormError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous() {
        let (quiz, book_id) = setup().await;
        quiz.create_question(book_id, input("old 1", 0)).await.unwrap();
        quiz.create_question(book_id, input("old 2", 1)).await.unwrap();

        let created = quiz
            .replace_all_questions(
                book_id,
                vec![input("new 1", 1), input("new 2", 0), input("new 3", 2)],
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 3);

        let stored = quiz.get_questions_with_answers(book_id).await.unwrap();
        let texts: Vec<_> = stored.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["new 1", "new 2", "new 3"]);
        let answers: Vec<_> = stored.iter().map(|q| q.correct_option).collect();
        assert_eq!(answers, vec![1, 0, 2]);
    }

    #[tokio::test]
    async fn test_replace_all_validates_before_deleting() {
        let (quiz, book_id) = setup().await;
        quiz.create_question(book_id, input("keep me", 0)).await.unwrap();

        let result = quiz
            .replace_all_questions(book_id, vec![input("fine", 0), input("bad", 7)])
            .await;
        assert!(matches!(result, Err(BookwormError::Validation(_))));
        assert_eq!(quiz.get_questions(book_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_questions() {
        let (quiz, book_id) = setup().await;
        quiz.create_question(book_id, input("q1", 0)).await.unwrap();
        quiz.create_question(book_id, input("q2", 1)).await.unwrap();
        assert_eq!(quiz.delete_all_questions(book_id).await.unwrap(), 2);
        assert!(quiz.get_questions(book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_question() {
        let (quiz, book_id) = setup().await;
        let question = quiz.create_question(book_id, input("q", 0)).await.unwrap();

        let updated = quiz
            .update_question(question.id, input("edited", 3))
            .await
            .unwrap();
        assert_eq!(updated.id, question.id);
        assert_eq!(updated.book_id, book_id);
        assert_eq!(updated.correct_option, 3);

        quiz.delete_question(question.id).await.unwrap();
        assert!(matches!(
            quiz.delete_question(question.id).await,
            Err(BookwormError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_records_only_passes() {
        let (quiz, book_id) = setup().await;
        quiz.replace_all_questions(book_id, vec![input("a", 1), input("b", 0), input("c", 2)])
            .await
            .unwrap();

        let sessions = SessionStore::new(std::time::Duration::from_secs(60), 10);
        let sid = sessions.open(1);

        let failed = quiz.verify(&sessions, &sid, book_id, &[1, 0, 1]).await.unwrap();
        assert!(!failed.passed);
        assert!(!sessions.is_verified(&sid, book_id));

        assert!(matches!(
            quiz.verify(&sessions, &sid, book_id, &[1, 0]).await,
            Err(BookwormError::IncompleteAnswers { expected: 3, got: 2 })
        ));

        let passed = quiz.verify(&sessions, &sid, book_id, &[1, 0, 2]).await.unwrap();
        assert!(passed.passed);
        assert!(sessions.is_verified(&sid, book_id));

        // a later failure does not revoke
        quiz.verify(&sessions, &sid, book_id, &[0, 0, 0]).await.unwrap();
        assert!(sessions.is_verified(&sid, book_id));
    }

    #[tokio::test]
    async fn test_verify_without_quiz() {
        let (quiz, book_id) = setup().await;
        let sessions = SessionStore::new(std::time::Duration::from_secs(60), 10);
        let sid = sessions.open(1);
        assert!(matches!(
            quiz.verify(&sessions, &sid, book_id, &[]).await,
            Err(BookwormError::NoQuizConfigured(_))
        ));
    }

    #[test]
    fn test_input_validation() {
        assert!(input("ok", 0).validate().is_ok());
        assert!(input("ok", 3).validate().is_ok());
        assert!(input("ok", 4).validate().is_err());
        assert!(input("ok", -1).validate().is_err());
        assert!(input("   ", 0).validate().is_err());

        let mut three = input("ok", 0);
        three.options.pop();
        assert!(three.validate().is_err());

        let mut blank = input("ok", 0);
        blank.options[1] = " ".into();
        assert!(blank.validate().is_err());
    }
}
