//! Storage seam for the catalog
//!
//! Everything the services persist goes through [`CatalogStore`]. MongoDB
//! backs it in production; the memory store backs dev mode and tests.
//!
//! Ids are sequential integers allocated by the store on insert and never
//! reused, even after deletes.

use async_trait::async_trait;

use crate::db::schemas::{BookDoc, LikedBookDoc, QuestionDoc, ReadingListDoc, ReviewDoc, UserDoc};
use crate::types::Result;

/// Catalog persistence
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- books ---

    /// Insert a book, assigning its id
    async fn insert_book(&self, book: BookDoc) -> Result<BookDoc>;
    async fn get_book(&self, id: i64) -> Result<Option<BookDoc>>;
    async fn get_books(&self, ids: &[i64]) -> Result<Vec<BookDoc>>;
    /// All books ordered by id, optionally restricted to one category
    async fn list_books(&self, category: Option<&str>) -> Result<Vec<BookDoc>>;
    /// Replace the descriptive fields of a book. Rating fields are left alone.
    async fn update_book(&self, book: &BookDoc) -> Result<bool>;
    /// Overwrite the derived rating fields
    async fn set_book_rating(&self, id: i64, average_rating: f64, review_count: i64) -> Result<bool>;
    /// Delete a book together with its questions, reviews and list entries
    async fn delete_book(&self, id: i64) -> Result<bool>;

    // --- users ---

    /// Insert a user, assigning its id. Fails with `Conflict` on a taken username.
    async fn insert_user(&self, user: UserDoc) -> Result<UserDoc>;
    async fn get_user(&self, id: i64) -> Result<Option<UserDoc>>;
    async fn get_users(&self, ids: &[i64]) -> Result<Vec<UserDoc>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserDoc>>;
    /// Activate or deactivate an account. `false` if no such user.
    async fn set_user_active(&self, id: i64, active: bool) -> Result<bool>;

    // --- quiz questions ---

    async fn insert_question(&self, question: QuestionDoc) -> Result<QuestionDoc>;
    async fn get_question(&self, id: i64) -> Result<Option<QuestionDoc>>;
    /// Questions for a book in id (insertion) order
    async fn list_questions(&self, book_id: i64) -> Result<Vec<QuestionDoc>>;
    async fn update_question(&self, question: &QuestionDoc) -> Result<bool>;
    async fn delete_question(&self, id: i64) -> Result<bool>;
    async fn delete_questions_for_book(&self, book_id: i64) -> Result<u64>;

    // --- reviews ---

    /// Insert a new review, assigning its id
    async fn insert_review(&self, review: ReviewDoc) -> Result<ReviewDoc>;
    /// Put back a previously deleted review under its original id
    async fn restore_review(&self, review: ReviewDoc) -> Result<()>;
    async fn get_review(&self, id: i64) -> Result<Option<ReviewDoc>>;
    /// Reviews for a book in id order
    async fn list_reviews(&self, book_id: i64) -> Result<Vec<ReviewDoc>>;
    /// Replace rating and content of an existing review
    async fn update_review(&self, review: &ReviewDoc) -> Result<bool>;
    async fn delete_review(&self, id: i64) -> Result<bool>;

    // --- reading list and likes ---

    /// Add a book to a reading list or move its progress
    async fn upsert_reading_entry(&self, user_id: i64, book_id: i64, progress: i32)
        -> Result<ReadingListDoc>;
    async fn list_reading_entries(&self, user_id: i64) -> Result<Vec<ReadingListDoc>>;
    async fn delete_reading_entry(&self, user_id: i64, book_id: i64) -> Result<bool>;

    /// Like a book; liking twice keeps the first timestamp
    async fn like_book(&self, user_id: i64, book_id: i64) -> Result<LikedBookDoc>;
    async fn list_liked_books(&self, user_id: i64) -> Result<Vec<LikedBookDoc>>;
    async fn unlike_book(&self, user_id: i64, book_id: i64) -> Result<bool>;
}
