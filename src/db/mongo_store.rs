//! MongoDB-backed catalog store

use async_trait::async_trait;
use bson::{doc, DateTime};
use tracing::{debug, info};

use crate::db::mongo::{MongoClient, MongoCollection, SequenceAllocator};
use crate::db::schemas::{
    BookDoc, LikedBookDoc, QuestionDoc, ReadingListDoc, ReviewDoc, UserDoc, BOOK_COLLECTION,
    LIKED_BOOK_COLLECTION, QUESTION_COLLECTION, READING_LIST_COLLECTION, REVIEW_COLLECTION,
    USER_COLLECTION,
};
use crate::db::store::CatalogStore;
use crate::types::{BookwormError, Result};

/// Catalog store persisted in MongoDB
pub struct MongoCatalogStore {
    sequences: SequenceAllocator,
    books: MongoCollection<BookDoc>,
    users: MongoCollection<UserDoc>,
    questions: MongoCollection<QuestionDoc>,
    reviews: MongoCollection<ReviewDoc>,
    reading: MongoCollection<ReadingListDoc>,
    liked: MongoCollection<LikedBookDoc>,
}

impl MongoCatalogStore {
    /// Open every collection, applying schema indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let store = Self {
            sequences: mongo.sequences(),
            books: mongo.collection(BOOK_COLLECTION).await?,
            users: mongo.collection(USER_COLLECTION).await?,
            questions: mongo.collection(QUESTION_COLLECTION).await?,
            reviews: mongo.collection(REVIEW_COLLECTION).await?,
            reading: mongo.collection(READING_LIST_COLLECTION).await?,
            liked: mongo.collection(LIKED_BOOK_COLLECTION).await?,
        };
        info!("MongoDB catalog store ready in '{}'", mongo.db_name());
        Ok(store)
    }
}

fn by_id(id: i64) -> bson::Document {
    doc! { "id": id }
}

fn sort_by_id() -> Option<bson::Document> {
    Some(doc! { "id": 1 })
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn insert_book(&self, mut book: BookDoc) -> Result<BookDoc> {
        book.id = self.sequences.next(BOOK_COLLECTION).await?;
        self.books.insert_one(book).await
    }

    async fn get_book(&self, id: i64) -> Result<Option<BookDoc>> {
        self.books.find_one(by_id(id)).await
    }

    async fn get_books(&self, ids: &[i64]) -> Result<Vec<BookDoc>> {
        self.books
            .find_many(doc! { "id": { "$in": ids.to_vec() } }, sort_by_id())
            .await
    }

    async fn list_books(&self, category: Option<&str>) -> Result<Vec<BookDoc>> {
        let filter = match category {
            Some(category) => doc! { "category": category },
            None => doc! {},
        };
        self.books.find_many(filter, sort_by_id()).await
    }

    async fn update_book(&self, book: &BookDoc) -> Result<bool> {
        let result = self
            .books
            .update_one(
                by_id(book.id),
                doc! {
                    "$set": {
                        "title": book.title.as_str(),
                        "author": book.author.as_str(),
                        "category": book.category.as_str(),
                        "description": book.description.as_str(),
                        "cover_url": book.cover_url.as_deref(),
                        "published_year": book.published_year,
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_book_rating(&self, id: i64, average_rating: f64, review_count: i64) -> Result<bool> {
        let result = self
            .books
            .update_one(
                by_id(id),
                doc! {
                    "$set": {
                        "average_rating": average_rating,
                        "review_count": review_count,
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_book(&self, id: i64) -> Result<bool> {
        // Dependents first: an interrupted cascade must not leave orphans under a live book
        let questions = self.questions.delete_many(doc! { "book_id": id }).await?;
        let reviews = self.reviews.delete_many(doc! { "book_id": id }).await?;
        let reading = self.reading.delete_many(doc! { "book_id": id }).await?;
        let liked = self.liked.delete_many(doc! { "book_id": id }).await?;
        debug!(
            "Book {} cascade: {} questions, {} reviews, {} reading entries, {} likes",
            id, questions, reviews, reading, liked
        );

        Ok(self.books.delete_one(by_id(id)).await? > 0)
    }

    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(BookwormError::Conflict(format!(
                "Username '{}' is taken",
                user.username
            )));
        }
        user.id = self.sequences.next(USER_COLLECTION).await?;
        self.users.insert_one(user).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserDoc>> {
        self.users.find_one(by_id(id)).await
    }

    async fn get_users(&self, ids: &[i64]) -> Result<Vec<UserDoc>> {
        self.users
            .find_many(doc! { "id": { "$in": ids.to_vec() } }, sort_by_id())
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "username": username }).await
    }

    async fn set_user_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = self
            .users
            .update_one(
                by_id(id),
                doc! {
                    "$set": {
                        "is_active": active,
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_question(&self, mut question: QuestionDoc) -> Result<QuestionDoc> {
        question.id = self.sequences.next(QUESTION_COLLECTION).await?;
        self.questions.insert_one(question).await
    }

    async fn get_question(&self, id: i64) -> Result<Option<QuestionDoc>> {
        self.questions.find_one(by_id(id)).await
    }

    async fn list_questions(&self, book_id: i64) -> Result<Vec<QuestionDoc>> {
        self.questions
            .find_many(doc! { "book_id": book_id }, sort_by_id())
            .await
    }

    async fn update_question(&self, question: &QuestionDoc) -> Result<bool> {
        let result = self
            .questions
            .update_one(
                by_id(question.id),
                doc! {
                    "$set": {
                        "question": question.question.as_str(),
                        "options": question.options.clone(),
                        "correct_option": question.correct_option,
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_question(&self, id: i64) -> Result<bool> {
        Ok(self.questions.delete_one(by_id(id)).await? > 0)
    }

    async fn delete_questions_for_book(&self, book_id: i64) -> Result<u64> {
        self.questions.delete_many(doc! { "book_id": book_id }).await
    }

    async fn insert_review(&self, mut review: ReviewDoc) -> Result<ReviewDoc> {
        review.id = self.sequences.next(REVIEW_COLLECTION).await?;
        self.reviews.insert_one(review).await
    }

    async fn restore_review(&self, review: ReviewDoc) -> Result<()> {
        self.reviews.insert_one(review).await.map(|_| ())
    }

    async fn get_review(&self, id: i64) -> Result<Option<ReviewDoc>> {
        self.reviews.find_one(by_id(id)).await
    }

    async fn list_reviews(&self, book_id: i64) -> Result<Vec<ReviewDoc>> {
        self.reviews
            .find_many(doc! { "book_id": book_id }, sort_by_id())
            .await
    }

    async fn update_review(&self, review: &ReviewDoc) -> Result<bool> {
        let result = self
            .reviews
            .update_one(
                by_id(review.id),
                doc! {
                    "$set": {
                        "rating": review.rating,
                        "content": review.content.as_str(),
                        "metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_review(&self, id: i64) -> Result<bool> {
        Ok(self.reviews.delete_one(by_id(id)).await? > 0)
    }

    async fn upsert_reading_entry(
        &self,
        user_id: i64,
        book_id: i64,
        progress: i32,
    ) -> Result<ReadingListDoc> {
        let filter = doc! { "user_id": user_id, "book_id": book_id };
        let now = DateTime::now();
        self.reading
            .upsert_one(
                filter.clone(),
                doc! {
                    "$set": { "progress": progress, "metadata.updated_at": now },
                    "$setOnInsert": { "metadata.created_at": now },
                },
            )
            .await?;

        self.reading
            .find_one(filter)
            .await?
            .ok_or_else(|| BookwormError::Database("Reading-list entry vanished after upsert".into()))
    }

    async fn list_reading_entries(&self, user_id: i64) -> Result<Vec<ReadingListDoc>> {
        self.reading
            .find_many(doc! { "user_id": user_id }, Some(doc! { "book_id": 1 }))
            .await
    }

    async fn delete_reading_entry(&self, user_id: i64, book_id: i64) -> Result<bool> {
        Ok(self
            .reading
            .delete_one(doc! { "user_id": user_id, "book_id": book_id })
            .await?
            > 0)
    }

    async fn like_book(&self, user_id: i64, book_id: i64) -> Result<LikedBookDoc> {
        let filter = doc! { "user_id": user_id, "book_id": book_id };
        let now = DateTime::now();
        self.liked
            .upsert_one(
                filter.clone(),
                doc! {
                    "$setOnInsert": {
                        "liked_at": now,
                        "metadata.created_at": now,
                        "metadata.updated_at": now,
                    },
                },
            )
            .await?;

        self.liked
            .find_one(filter)
            .await?
            .ok_or_else(|| BookwormError::Database("Liked-book entry vanished after upsert".into()))
    }

    async fn list_liked_books(&self, user_id: i64) -> Result<Vec<LikedBookDoc>> {
        self.liked
            .find_many(doc! { "user_id": user_id }, Some(doc! { "liked_at": -1 }))
            .await
    }

    async fn unlike_book(&self, user_id: i64, book_id: i64) -> Result<bool> {
        Ok(self
            .liked
            .delete_one(doc! { "user_id": user_id, "book_id": book_id })
            .await?
            > 0)
    }
}
