//! Book rating aggregation
//!
//! The aggregate is always recomputed from every review of the book, never
//! adjusted incrementally, so running it twice changes nothing.

use serde::Serialize;
use tracing::debug;

use crate::db::CatalogStore;
use crate::types::{BookwormError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub review_count: i64,
}

/// Arithmetic mean of `ratings`; zero when there are none
pub fn summarize(ratings: &[i32]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary {
            average_rating: 0.0,
            review_count: 0,
        };
    }

    let total: i64 = ratings.iter().map(|&r| r as i64).sum();
    RatingSummary {
        average_rating: total as f64 / ratings.len() as f64,
        review_count: ratings.len() as i64,
    }
}

/// Recompute and persist the rating of `book_id`
pub async fn recompute(store: &dyn CatalogStore, book_id: i64) -> Result<RatingSummary> {
    let reviews = store.list_reviews(book_id).await?;
    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    let summary = summarize(&ratings);

    if !store
        .set_book_rating(book_id, summary.average_rating, summary.review_count)
        .await?
    {
        return Err(BookwormError::NotFound(format!("Book {}", book_id)));
    }

    debug!(
        "Book {} rating recomputed: {:.2} over {} reviews",
        book_id, summary.average_rating, summary.review_count
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{BookDoc, ReviewDoc};
    use crate::db::MemoryCatalogStore;

    #[test]
    fn test_summarize() {
        let summary = summarize(&[5, 3, 4]);
        assert_eq!(summary.review_count, 3);
        assert!((summary.average_rating - 4.0).abs() < f64::EPSILON);

        let summary = summarize(&[5, 4]);
        assert!((summary.average_rating - 4.5).abs() < f64::EPSILON);

        assert_eq!(
            summarize(&[]),
            RatingSummary {
                average_rating: 0.0,
                review_count: 0
            }
        );
    }

    #[tokio::test]
    async fn test_recompute_persists_and_is_idempotent() {
        let store = MemoryCatalogStore::new();
        let book = store
            .insert_book(BookDoc {
                title: "Dune".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        for rating in [5, 3, 4] {
            store
                .insert_review(ReviewDoc {
                    book_id: book.id,
                    user_id: 1,
                    rating,
                    content: "fine".into(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let first = recompute(&store, book.id).await.unwrap();
        let second = recompute(&store, book.id).await.unwrap();
        assert_eq!(first, second);

        let stored = store.get_book(book.id).await.unwrap().unwrap();
        assert_eq!(stored.review_count, 3);
        assert!((stored.average_rating - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_recompute_missing_book() {
        let store = MemoryCatalogStore::new();
        assert!(matches!(
            recompute(&store, 99).await,
            Err(BookwormError::NotFound(_))
        ));
    }
}
