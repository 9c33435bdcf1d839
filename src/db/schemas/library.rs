//! Reading-list and liked-book association schemas
//!
//! Both are keyed by (user_id, book_id); a user has at most one entry of each
//! kind per book.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for reading-list entries
pub const READING_LIST_COLLECTION: &str = "reading_list";

/// Collection name for liked books
pub const LIKED_BOOK_COLLECTION: &str = "liked_books";

/// A book on a user's reading list
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReadingListDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: i64,

    pub book_id: i64,

    /// Percentage read, 0 to 100
    #[serde(default)]
    pub progress: i32,
}

/// A book a user has liked
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LikedBookDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: i64,

    pub book_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_at: Option<DateTime>,
}

impl IntoIndexes for ReadingListDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "book_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("reading_list_user_book_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ReadingListDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl IntoIndexes for LikedBookDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "book_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("liked_user_book_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for LikedBookDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
