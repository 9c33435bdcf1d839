//! Quiz question document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for quiz questions
pub const QUESTION_COLLECTION: &str = "questions";

/// Quiz question document stored in MongoDB.
///
/// `correct_option` indexes into `options` and must never leave the server
/// on a non-admin path.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct QuestionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,

    pub book_id: i64,

    pub question: String,

    pub options: Vec<String>,

    pub correct_option: i32,
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("question_id_unique".to_string())
                        .build(),
                ),
            ),
            // Quiz lookups always go by book, in id order
            (
                doc! { "book_id": 1, "id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("book_questions_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for QuestionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
