//! In-memory catalog store
//!
//! Used in dev mode when MongoDB is unavailable and by the test suite. All
//! tables sit behind one lock, so each call is atomic with respect to others.

use async_trait::async_trait;
use bson::DateTime;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::db::mongo::MutMetadata;
use crate::db::schemas::{
    BookDoc, LikedBookDoc, Metadata, QuestionDoc, ReadingListDoc, ReviewDoc, UserDoc,
    BOOK_COLLECTION, QUESTION_COLLECTION, REVIEW_COLLECTION, USER_COLLECTION,
};
use crate::db::store::CatalogStore;
use crate::types::{BookwormError, Result};

#[derive(Default)]
struct Tables {
    books: BTreeMap<i64, BookDoc>,
    users: BTreeMap<i64, UserDoc>,
    questions: BTreeMap<i64, QuestionDoc>,
    reviews: BTreeMap<i64, ReviewDoc>,
    reading: BTreeMap<(i64, i64), ReadingListDoc>,
    liked: BTreeMap<(i64, i64), LikedBookDoc>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    fn next_id(&mut self, name: &'static str) -> i64 {
        let seq = self.sequences.entry(name).or_insert(0);
        *seq += 1;
        *seq
    }
}

fn stamp<T: MutMetadata>(item: &mut T) {
    let metadata = item.mut_metadata();
    let now = DateTime::now();
    if metadata.created_at.is_none() {
        metadata.created_at = Some(now);
    }
    metadata.updated_at = Some(now);
}

/// Catalog store held entirely in process memory
#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    fail_rating_writes: std::sync::atomic::AtomicBool,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_book_rating` fail
    #[cfg(test)]
    pub(crate) fn fail_rating_writes(&self, fail: bool) {
        self.fail_rating_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    fn rating_writes_fail(&self) -> bool {
        self.fail_rating_writes
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn rating_writes_fail(&self) -> bool {
        false
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_book(&self, mut book: BookDoc) -> Result<BookDoc> {
        let mut tables = self.tables.write().await;
        book.id = tables.next_id(BOOK_COLLECTION);
        stamp(&mut book);
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: i64) -> Result<Option<BookDoc>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn get_books(&self, ids: &[i64]) -> Result<Vec<BookDoc>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.books.get(id).cloned())
            .collect())
    }

    async fn list_books(&self, category: Option<&str>) -> Result<Vec<BookDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|book| category.map_or(true, |c| book.category == c))
            .cloned()
            .collect())
    }

    async fn update_book(&self, book: &BookDoc) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(&book.id) {
            Some(existing) => {
                existing.title = book.title.clone();
                existing.author = book.author.clone();
                existing.category = book.category.clone();
                existing.description = book.description.clone();
                existing.cover_url = book.cover_url.clone();
                existing.published_year = book.published_year;
                existing.metadata.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_book_rating(&self, id: i64, average_rating: f64, review_count: i64) -> Result<bool> {
        if self.rating_writes_fail() {
            return Err(BookwormError::Database("rating write refused".into()));
        }
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(&id) {
            Some(book) => {
                book.average_rating = average_rating;
                book.review_count = review_count;
                book.metadata.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.books.remove(&id).is_none() {
            return Ok(false);
        }
        tables.questions.retain(|_, q| q.book_id != id);
        tables.reviews.retain(|_, r| r.book_id != id);
        tables.reading.retain(|(_, book_id), _| *book_id != id);
        tables.liked.retain(|(_, book_id), _| *book_id != id);
        Ok(true)
    }

    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(BookwormError::Conflict(format!(
                "Username '{}' is taken",
                user.username
            )));
        }
        user.id = tables.next_id(USER_COLLECTION);
        stamp(&mut user);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserDoc>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[i64]) -> Result<Vec<UserDoc>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn set_user_active(&self, id: i64, active: bool) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                stamp(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_question(&self, mut question: QuestionDoc) -> Result<QuestionDoc> {
        let mut tables = self.tables.write().await;
        question.id = tables.next_id(QUESTION_COLLECTION);
        stamp(&mut question);
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: i64) -> Result<Option<QuestionDoc>> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn list_questions(&self, book_id: i64) -> Result<Vec<QuestionDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| q.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn update_question(&self, question: &QuestionDoc) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.questions.get_mut(&question.id) {
            Some(existing) => {
                existing.question = question.question.clone();
                existing.options = question.options.clone();
                existing.correct_option = question.correct_option;
                existing.metadata.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.questions.remove(&id).is_some())
    }

    async fn delete_questions_for_book(&self, book_id: i64) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.questions.len();
        tables.questions.retain(|_, q| q.book_id != book_id);
        Ok((before - tables.questions.len()) as u64)
    }

    async fn insert_review(&self, mut review: ReviewDoc) -> Result<ReviewDoc> {
        let mut tables = self.tables.write().await;
        review.id = tables.next_id(REVIEW_COLLECTION);
        stamp(&mut review);
        tables.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn restore_review(&self, review: ReviewDoc) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.reviews.contains_key(&review.id) {
            return Err(BookwormError::Conflict(format!(
                "Review {} already exists",
                review.id
            )));
        }
        tables.reviews.insert(review.id, review);
        Ok(())
    }

    async fn get_review(&self, id: i64) -> Result<Option<ReviewDoc>> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews(&self, book_id: i64) -> Result<Vec<ReviewDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn update_review(&self, review: &ReviewDoc) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&review.id) {
            Some(existing) => {
                existing.rating = review.rating;
                existing.content = review.content.clone();
                existing.metadata.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_review(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.reviews.remove(&id).is_some())
    }

    async fn upsert_reading_entry(
        &self,
        user_id: i64,
        book_id: i64,
        progress: i32,
    ) -> Result<ReadingListDoc> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .reading
            .entry((user_id, book_id))
            .or_insert_with(|| ReadingListDoc {
                _id: None,
                metadata: Metadata::new(),
                user_id,
                book_id,
                progress: 0,
            });
        entry.progress = progress;
        entry.metadata.touch();
        Ok(entry.clone())
    }

    async fn list_reading_entries(&self, user_id: i64) -> Result<Vec<ReadingListDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reading
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_reading_entry(&self, user_id: i64, book_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .reading
            .remove(&(user_id, book_id))
            .is_some())
    }

    async fn like_book(&self, user_id: i64, book_id: i64) -> Result<LikedBookDoc> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .liked
            .entry((user_id, book_id))
            .or_insert_with(|| LikedBookDoc {
                _id: None,
                metadata: Metadata::new(),
                user_id,
                book_id,
                liked_at: Some(DateTime::now()),
            });
        Ok(entry.clone())
    }

    async fn list_liked_books(&self, user_id: i64) -> Result<Vec<LikedBookDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .liked
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn unlike_book(&self, user_id: i64, book_id: i64) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .liked
            .remove(&(user_id, book_id))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, category: &str) -> BookDoc {
        BookDoc {
            title: title.into(),
            author: "Anon".into(),
            category: category.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_not_reused() {
        let store = MemoryCatalogStore::new();
        let a = store.insert_book(book("A", "x")).await.unwrap();
        let b = store.insert_book(book("B", "x")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete_book(b.id).await.unwrap();
        let c = store.insert_book(book("C", "x")).await.unwrap();
        assert_eq!(c.id, 3);
        assert!(c.metadata.created_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_book_cascades() {
        let store = MemoryCatalogStore::new();
        let kept = store.insert_book(book("Kept", "x")).await.unwrap();
        let gone = store.insert_book(book("Gone", "x")).await.unwrap();

        for book_id in [kept.id, gone.id] {
            store
                .insert_question(QuestionDoc {
                    book_id,
                    question: "q".into(),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    ..Default::default()
                })
                .await
                .unwrap();
            store
                .insert_review(ReviewDoc {
                    book_id,
                    user_id: 1,
                    rating: 4,
                    content: "fine".into(),
                    ..Default::default()
                })
                .await
                .unwrap();
            store.upsert_reading_entry(1, book_id, 50).await.unwrap();
            store.like_book(1, book_id).await.unwrap();
        }

        assert!(store.delete_book(gone.id).await.unwrap());

        assert!(store.list_questions(gone.id).await.unwrap().is_empty());
        assert!(store.list_reviews(gone.id).await.unwrap().is_empty());
        assert_eq!(store.list_reading_entries(1).await.unwrap().len(), 1);
        assert_eq!(store.list_liked_books(1).await.unwrap().len(), 1);
        assert_eq!(store.list_questions(kept.id).await.unwrap().len(), 1);
        assert!(!store.delete_book(gone.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_books_by_category() {
        let store = MemoryCatalogStore::new();
        store.insert_book(book("Dune", "sci-fi")).await.unwrap();
        store.insert_book(book("Emma", "classic")).await.unwrap();

        assert_eq!(store.list_books(None).await.unwrap().len(), 2);
        let scifi = store.list_books(Some("sci-fi")).await.unwrap();
        assert_eq!(scifi.len(), 1);
        assert_eq!(scifi[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryCatalogStore::new();
        let user = UserDoc::new("ada".into(), "Ada".into(), "hash".into(), false);
        store.insert_user(user.clone()).await.unwrap();
        assert!(matches!(
            store.insert_user(user).await,
            Err(BookwormError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_reading_entry_upsert_and_like_idempotence() {
        let store = MemoryCatalogStore::new();
        store.upsert_reading_entry(1, 5, 10).await.unwrap();
        let updated = store.upsert_reading_entry(1, 5, 80).await.unwrap();
        assert_eq!(updated.progress, 80);
        assert_eq!(store.list_reading_entries(1).await.unwrap().len(), 1);

        let first = store.like_book(1, 5).await.unwrap();
        let second = store.like_book(1, 5).await.unwrap();
        assert_eq!(first.liked_at, second.liked_at);
        assert!(store.unlike_book(1, 5).await.unwrap());
        assert!(!store.unlike_book(1, 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_review_keeps_id() {
        let store = MemoryCatalogStore::new();
        let review = store
            .insert_review(ReviewDoc {
                book_id: 1,
                user_id: 1,
                rating: 3,
                content: "ok".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store.delete_review(review.id).await.unwrap();
        store.restore_review(review.clone()).await.unwrap();
        assert_eq!(store.get_review(review.id).await.unwrap(), Some(review.clone()));
        assert!(store.restore_review(review).await.is_err());
    }
}
