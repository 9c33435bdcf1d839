//! Review persistence with rating upkeep
//!
//! A review mutation and the recomputation of its book's rating succeed or
//! fail together. There is no multi-document transaction underneath, so a
//! failed recompute is compensated by undoing the mutation before the error
//! is returned.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::schemas::{Metadata, ReviewDoc};
use crate::db::CatalogStore;
use crate::quiz::QuizStore;
use crate::reviews::aggregate::recompute;
use crate::reviews::gate::AdmissionPolicy;
use crate::session::{SessionContext, SessionStore};
use crate::types::{BookwormError, Result};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Body of a new review
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub rating: i32,
    pub content: String,
    /// Client-asserted verification; only honoured when the policy trusts it
    #[serde(default)]
    pub verified: bool,
    /// Quiz answers to check before admission
    #[serde(default)]
    pub answers: Option<Vec<i32>>,
}

/// Body of a review edit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEdit {
    pub rating: i32,
    pub content: String,
}

fn validate(rating: i32, content: &str) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(BookwormError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    if content.trim().is_empty() {
        return Err(BookwormError::Validation("Review content is required".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn CatalogStore>,
    sessions: Arc<SessionStore>,
    quiz: QuizStore,
    policy: AdmissionPolicy,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        sessions: Arc<SessionStore>,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            quiz: QuizStore::new(store.clone()),
            store,
            sessions,
            policy,
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    pub async fn get_review(&self, review_id: i64) -> Result<ReviewDoc> {
        self.store
            .get_review(review_id)
            .await?
            .ok_or_else(|| BookwormError::NotFound(format!("Review {}", review_id)))
    }

    pub async fn list_reviews(&self, book_id: i64) -> Result<Vec<ReviewDoc>> {
        if self.store.get_book(book_id).await?.is_none() {
            return Err(BookwormError::NotFound(format!("Book {}", book_id)));
        }
        self.store.list_reviews(book_id).await
    }

    /// Gate, persist, then recompute the book rating
    pub async fn create_review(
        &self,
        ctx: &SessionContext,
        book_id: i64,
        input: NewReview,
    ) -> Result<ReviewDoc> {
        validate(input.rating, &input.content)?;

        if self.store.get_book(book_id).await?.is_none() {
            return Err(BookwormError::NotFound(format!("Book {}", book_id)));
        }
        let quiz_len = self.store.list_questions(book_id).await?.len();

        if let Some(answers) = input.answers.as_deref() {
            if quiz_len > 0 {
                self.quiz
                    .verify(&self.sessions, &ctx.session_id, book_id, answers)
                    .await?;
            }
        }

        self.policy.admit(
            &self.sessions,
            &ctx.session_id,
            book_id,
            quiz_len,
            input.verified,
        )?;

        let review = self
            .store
            .insert_review(ReviewDoc {
                _id: None,
                metadata: Metadata::new(),
                id: 0,
                book_id,
                user_id: ctx.user_id,
                rating: input.rating,
                content: input.content.trim().to_string(),
            })
            .await?;

        if let Err(e) = recompute(self.store.as_ref(), book_id).await {
            warn!(
                "Rating recompute failed for book {}, withdrawing review {}: {}",
                book_id, review.id, e
            );
            if let Err(undo) = self.store.delete_review(review.id).await {
                error!("Failed to withdraw review {}: {}", review.id, undo);
            }
            return Err(e);
        }

        info!(
            "User {} reviewed book {} ({} stars)",
            ctx.user_id, book_id, review.rating
        );
        Ok(review)
    }

    pub async fn update_review(
        &self,
        ctx: &SessionContext,
        review_id: i64,
        edit: ReviewEdit,
    ) -> Result<ReviewDoc> {
        validate(edit.rating, &edit.content)?;

        let previous = self.get_review(review_id).await?;
        ctx.require_owner_or_admin(previous.user_id)?;

        let mut updated = previous.clone();
        updated.rating = edit.rating;
        updated.content = edit.content.trim().to_string();

        if !self.store.update_review(&updated).await? {
            return Err(BookwormError::NotFound(format!("Review {}", review_id)));
        }

        if let Err(e) = recompute(self.store.as_ref(), updated.book_id).await {
            warn!(
                "Rating recompute failed for book {}, reverting review {}: {}",
                updated.book_id, review_id, e
            );
            if let Err(undo) = self.store.update_review(&previous).await {
                error!("Failed to revert review {}: {}", review_id, undo);
            }
            return Err(e);
        }

        Ok(updated)
    }

    pub async fn delete_review(&self, ctx: &SessionContext, review_id: i64) -> Result<()> {
        let previous = self.get_review(review_id).await?;
        ctx.require_owner_or_admin(previous.user_id)?;

        if !self.store.delete_review(review_id).await? {
            return Err(BookwormError::NotFound(format!("Review {}", review_id)));
        }

        if let Err(e) = recompute(self.store.as_ref(), previous.book_id).await {
            warn!(
                "Rating recompute failed for book {}, restoring review {}: {}",
                previous.book_id, review_id, e
            );
            if let Err(undo) = self.store.restore_review(previous).await {
                error!("Failed to restore review {}: {}", review_id, undo);
            }
            return Err(e);
        }

        info!("Review {} deleted by user {}", review_id, ctx.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PermissionLevel;
    use crate::db::schemas::{BookDoc, QuestionDoc};
    use crate::db::MemoryCatalogStore;
    use std::time::Duration;

    struct Fixture {
        memory: Arc<MemoryCatalogStore>,
        sessions: Arc<SessionStore>,
        service: ReviewService,
        book_id: i64,
    }

    async fn fixture(policy: AdmissionPolicy, correct: &[i32]) -> Fixture {
        let memory = Arc::new(MemoryCatalogStore::new());
        let book = memory
            .insert_book(BookDoc {
                title: "Middlemarch".into(),
                author: "George Eliot".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        for &correct_option in correct {
            memory
                .insert_question(QuestionDoc {
                    book_id: book.id,
                    question: "?".into(),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let sessions = Arc::new(SessionStore::new(Duration::from_secs(60), 100));
        let store: Arc<dyn CatalogStore> = memory.clone();
        Fixture {
            service: ReviewService::new(store, sessions.clone(), policy),
            memory,
            sessions,
            book_id: book.id,
        }
    }

    fn reader(sessions: &SessionStore, user_id: i64) -> SessionContext {
        SessionContext {
            session_id: sessions.open(user_id),
            user_id,
            username: format!("reader{}", user_id),
            permission_level: PermissionLevel::Authenticated,
        }
    }

    fn review(rating: i32) -> NewReview {
        NewReview {
            rating,
            content: "Worth it".into(),
            ..Default::default()
        }
    }

    async fn rating_of(f: &Fixture) -> (f64, i64) {
        let book = f.memory.get_book(f.book_id).await.unwrap().unwrap();
        (book.average_rating, book.review_count)
    }

    #[tokio::test]
    async fn test_unverified_session_is_rejected() {
        let f = fixture(AdmissionPolicy::default(), &[1, 0, 2]).await;
        let ctx = reader(&f.sessions, 1);

        let result = f.service.create_review(&ctx, f.book_id, review(5)).await;
        assert!(matches!(result, Err(BookwormError::NotVerified(_))));
        assert!(f.service.list_reviews(f.book_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verified_session_is_admitted() {
        let f = fixture(AdmissionPolicy::default(), &[1, 0, 2]).await;
        let ctx = reader(&f.sessions, 1);
        f.sessions.mark_verified(&ctx.session_id, f.book_id).unwrap();

        let created = f.service.create_review(&ctx, f.book_id, review(4)).await.unwrap();
        assert_eq!(created.user_id, 1);
        assert_eq!(rating_of(&f).await, (4.0, 1));

        // verification does not carry over to a new session of the same user
        let fresh = reader(&f.sessions, 1);
        assert!(matches!(
            f.service.create_review(&fresh, f.book_id, review(4)).await,
            Err(BookwormError::NotVerified(_))
        ));
    }

    #[tokio::test]
    async fn test_book_without_quiz_needs_no_verification() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let ctx = reader(&f.sessions, 1);
        assert!(f.service.create_review(&ctx, f.book_id, review(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_inline_flag_needs_trust() {
        let untrusted = fixture(AdmissionPolicy::default(), &[0]).await;
        let ctx = reader(&untrusted.sessions, 1);
        let flagged = NewReview {
            verified: true,
            ..review(5)
        };
        assert!(matches!(
            untrusted.service.create_review(&ctx, untrusted.book_id, flagged.clone()).await,
            Err(BookwormError::NotVerified(_))
        ));

        let trusted = fixture(AdmissionPolicy::new(true), &[0]).await;
        let ctx = reader(&trusted.sessions, 1);
        assert!(trusted
            .service
            .create_review(&ctx, trusted.book_id, flagged)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_inline_answers_verify_then_admit() {
        let f = fixture(AdmissionPolicy::default(), &[1, 0, 2]).await;
        let ctx = reader(&f.sessions, 1);

        let wrong = NewReview {
            answers: Some(vec![1, 0, 1]),
            ..review(5)
        };
        assert!(matches!(
            f.service.create_review(&ctx, f.book_id, wrong).await,
            Err(BookwormError::NotVerified(_))
        ));

        let right = NewReview {
            answers: Some(vec![1, 0, 2]),
            ..review(5)
        };
        f.service.create_review(&ctx, f.book_id, right).await.unwrap();
        assert!(f.sessions.is_verified(&ctx.session_id, f.book_id));
    }

    #[tokio::test]
    async fn test_rating_follows_mutations() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let ctx = reader(&f.sessions, 1);

        let mut ids = Vec::new();
        for rating in [5, 3, 4] {
            ids.push(f.service.create_review(&ctx, f.book_id, review(rating)).await.unwrap().id);
        }
        assert_eq!(rating_of(&f).await, (4.0, 3));

        f.service.delete_review(&ctx, ids[1]).await.unwrap();
        assert_eq!(rating_of(&f).await, (4.5, 2));

        f.service
            .update_review(
                &ctx,
                ids[0],
                ReviewEdit {
                    rating: 2,
                    content: "Changed my mind".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(rating_of(&f).await, (3.0, 2));

        f.service.delete_review(&ctx, ids[0]).await.unwrap();
        f.service.delete_review(&ctx, ids[2]).await.unwrap();
        assert_eq!(rating_of(&f).await, (0.0, 0));
    }

    #[tokio::test]
    async fn test_failed_recompute_withdraws_new_review() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let ctx = reader(&f.sessions, 1);

        f.memory.fail_rating_writes(true);
        assert!(matches!(
            f.service.create_review(&ctx, f.book_id, review(5)).await,
            Err(BookwormError::Database(_))
        ));
        assert!(f.service.list_reviews(f.book_id).await.unwrap().is_empty());
        assert_eq!(rating_of(&f).await, (0.0, 0));
    }

    #[tokio::test]
    async fn test_failed_recompute_reverts_update_and_delete() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let ctx = reader(&f.sessions, 1);
        let created = f.service.create_review(&ctx, f.book_id, review(5)).await.unwrap();

        f.memory.fail_rating_writes(true);

        let edit = ReviewEdit {
            rating: 1,
            content: "Nope".into(),
        };
        assert!(f.service.update_review(&ctx, created.id, edit).await.is_err());
        let kept = f.service.get_review(created.id).await.unwrap();
        assert_eq!(kept.rating, 5);
        assert_eq!(kept.content, "Worth it");

        assert!(f.service.delete_review(&ctx, created.id).await.is_err());
        assert!(f.service.get_review(created.id).await.is_ok());

        f.memory.fail_rating_writes(false);
        assert_eq!(rating_of(&f).await, (5.0, 1));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_may_modify() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let author = reader(&f.sessions, 1);
        let created = f.service.create_review(&author, f.book_id, review(5)).await.unwrap();

        let stranger = reader(&f.sessions, 2);
        assert!(matches!(
            f.service.delete_review(&stranger, created.id).await,
            Err(BookwormError::Forbidden(_))
        ));

        let admin = SessionContext {
            permission_level: PermissionLevel::Admin,
            ..reader(&f.sessions, 3)
        };
        f.service.delete_review(&admin, created.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_validation() {
        let f = fixture(AdmissionPolicy::default(), &[]).await;
        let ctx = reader(&f.sessions, 1);

        for rating in [0, 6] {
            assert!(matches!(
                f.service.create_review(&ctx, f.book_id, review(rating)).await,
                Err(BookwormError::Validation(_))
            ));
        }
        let blank = NewReview {
            content: "  ".into(),
            ..review(3)
        };
        assert!(matches!(
            f.service.create_review(&ctx, f.book_id, blank).await,
            Err(BookwormError::Validation(_))
        ));
        assert!(matches!(
            f.service.create_review(&ctx, 999, review(3)).await,
            Err(BookwormError::NotFound(_))
        ));
    }
}
