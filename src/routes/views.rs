//! JSON shapes returned by the API
//!
//! Documents are never serialized directly: they carry Mongo ids, password
//! hashes and snake_case field names.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::schemas::{BookDoc, LikedBookDoc, Metadata, ReadingListDoc, ReviewDoc, UserDoc};
use crate::db::CatalogStore;
use crate::types::Result;

fn timestamp(dt: Option<bson::DateTime>) -> Option<DateTime<Utc>> {
    dt.map(|dt| dt.to_chrono())
}

fn created_at(metadata: &Metadata) -> Option<DateTime<Utc>> {
    timestamp(metadata.created_at)
}

fn updated_at(metadata: &Metadata) -> Option<DateTime<Utc>> {
    timestamp(metadata.updated_at)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    pub average_rating: f64,
    pub review_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&BookDoc> for BookView {
    fn from(book: &BookDoc) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            description: book.description.clone(),
            cover_url: book.cover_url.clone(),
            published_year: book.published_year,
            average_rating: book.average_rating,
            review_count: book.review_count,
            created_at: created_at(&book.metadata),
            updated_at: updated_at(&book.metadata),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&UserDoc> for UserView {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
            created_at: created_at(&user.metadata),
        }
    }
}

/// Author attribution attached to each review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i64,
    pub book_id: i64,
    pub rating: i32,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user: UserSummary,
}

impl ReviewView {
    pub fn new(review: &ReviewDoc, author: Option<&UserDoc>) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            rating: review.rating,
            content: review.content.clone(),
            created_at: created_at(&review.metadata),
            updated_at: updated_at(&review.metadata),
            user: UserSummary {
                id: review.user_id,
                display_name: author
                    .map(|u| u.display_name.clone())
                    .unwrap_or_else(|| "Unknown reader".to_string()),
            },
        }
    }
}

/// Attach author summaries to a batch of reviews with a single user lookup
pub async fn review_views(store: &dyn CatalogStore, reviews: &[ReviewDoc]) -> Result<Vec<ReviewView>> {
    let mut user_ids: Vec<i64> = reviews.iter().map(|r| r.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let users: HashMap<i64, UserDoc> = store
        .get_users(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(reviews
        .iter()
        .map(|r| ReviewView::new(r, users.get(&r.user_id)))
        .collect())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEntryView {
    pub book: BookView,
    pub progress: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReadingEntryView {
    pub fn new(entry: &ReadingListDoc, book: &BookDoc) -> Self {
        Self {
            book: BookView::from(book),
            progress: entry.progress,
            updated_at: updated_at(&entry.metadata),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedBookView {
    pub book: BookView,
    pub liked_at: Option<DateTime<Utc>>,
}

impl LikedBookView {
    pub fn new(like: &LikedBookDoc, book: &BookDoc) -> Self {
        Self {
            book: BookView::from(book),
            liked_at: timestamp(like.liked_at),
        }
    }
}

/// Load the books referenced by `ids`, keyed by id
pub async fn books_by_id(store: &dyn CatalogStore, ids: &[i64]) -> Result<HashMap<i64, BookDoc>> {
    Ok(store
        .get_books(ids)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCatalogStore;

    #[test]
    fn test_book_view_is_camel_case() {
        let book = BookDoc {
            id: 1,
            title: "Emma".into(),
            cover_url: Some("https://covers.example/emma.jpg".into()),
            review_count: 2,
            average_rating: 4.5,
            ..Default::default()
        };
        let json = serde_json::to_value(BookView::from(&book)).unwrap();
        assert_eq!(json["reviewCount"], 2);
        assert_eq!(json["averageRating"], 4.5);
        assert!(json.get("coverUrl").is_some());
        assert!(json.get("publishedYear").is_none());
    }

    #[test]
    fn test_user_view_hides_hash() {
        let user = UserDoc::new("ada".into(), "Ada".into(), "$argon2id$secret".into(), false);
        let text = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!text.contains("argon2"));
        assert!(text.contains("displayName"));
    }

    #[tokio::test]
    async fn test_review_views_attach_authors() {
        let store = MemoryCatalogStore::new();
        let ada = store
            .insert_user(UserDoc::new("ada".into(), "Ada L.".into(), "h".into(), false))
            .await
            .unwrap();

        let reviews = vec![
            ReviewDoc {
                id: 1,
                user_id: ada.id,
                rating: 5,
                ..Default::default()
            },
            ReviewDoc {
                id: 2,
                user_id: 999,
                rating: 3,
                ..Default::default()
            },
        ];
        let views = review_views(&store, &reviews).await.unwrap();
        assert_eq!(views[0].user.display_name, "Ada L.");
        assert_eq!(views[0].user.id, ada.id);
        assert_eq!(views[1].user.display_name, "Unknown reader");
    }
}
