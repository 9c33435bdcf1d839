//! Database schemas for Bookworm
//!
//! Defines MongoDB document structures for the catalog, quizzes, reviews,
//! users and per-user book lists.

mod book;
mod library;
mod metadata;
mod question;
mod review;
mod user;

pub use book::{BookDoc, BOOK_COLLECTION};
pub use library::{LikedBookDoc, ReadingListDoc, LIKED_BOOK_COLLECTION, READING_LIST_COLLECTION};
pub use metadata::Metadata;
pub use question::{QuestionDoc, QUESTION_COLLECTION};
pub use review::{ReviewDoc, REVIEW_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
