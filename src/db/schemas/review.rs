//! Review document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for reviews
pub const REVIEW_COLLECTION: &str = "reviews";

/// Review document stored in MongoDB.
/// The creation time is `metadata.created_at`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReviewDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,

    pub book_id: i64,

    pub user_id: i64,

    /// Star rating, 1 to 5
    pub rating: i32,

    pub content: String,
}

impl IntoIndexes for ReviewDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("review_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "book_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("book_reviews_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_reviews_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ReviewDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
