//! MongoDB client and collection wrapper

use bson::{doc, DateTime, Document};
use mongodb::{
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use futures_util::{Stream, TryStreamExt};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::BookwormError;

/// Collection holding one sequence counter per entity type
pub const COUNTER_COLLECTION: &str = "counters";

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, BookwormError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| BookwormError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BookwormError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, BookwormError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the sequence allocator for this database
    pub fn sequences(&self) -> SequenceAllocator {
        SequenceAllocator {
            inner: self
                .client
                .database(&self.db_name)
                .collection::<CounterDoc>(COUNTER_COLLECTION),
        }
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// One named counter
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CounterDoc {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

/// Hands out sequential integer ids backed by the `counters` collection
#[derive(Clone)]
pub struct SequenceAllocator {
    inner: Collection<CounterDoc>,
}

impl SequenceAllocator {
    /// Atomically increment and return the counter for `name` (first id is 1)
    pub async fn next(&self, name: &str) -> Result<i64, BookwormError> {
        let counter = self
            .inner
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| BookwormError::Database(format!("Sequence update failed: {}", e)))?
            .ok_or_else(|| BookwormError::Database(format!("Sequence '{}' missing", name)))?;

        Ok(counter.seq)
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, BookwormError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), BookwormError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| BookwormError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<T, BookwormError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        if metadata.created_at.is_none() {
            metadata.created_at = Some(now);
        }
        metadata.updated_at = Some(now);

        self.inner
            .insert_one(&item)
            .await
            .map_err(map_write_error)?;

        Ok(item)
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, BookwormError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| BookwormError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, optionally sorted
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, BookwormError> {
        let cursor = match sort {
            Some(sort) => self.inner.find(filter).sort(sort).await,
            None => self.inner.find(filter).await,
        }
        .map_err(|e| BookwormError::Database(format!("Find failed: {}", e)))?;

        collect_documents(cursor).await
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, BookwormError> {
        self.inner
            .update_one(filter, update)
            .await
            .map_err(map_write_error)
    }

    /// Update one document, inserting it if nothing matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, BookwormError> {
        self.inner
            .update_one(filter, update)
            .upsert(true)
            .await
            .map_err(map_write_error)
    }

    /// Delete one document, returning how many were removed
    pub async fn delete_one(&self, filter: Document) -> Result<u64, BookwormError> {
        self.inner
            .delete_one(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| BookwormError::Database(format!("Delete failed: {}", e)))
    }

    /// Delete every matching document, returning how many were removed
    pub async fn delete_many(&self, filter: Document) -> Result<u64, BookwormError> {
        self.inner
            .delete_many(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| BookwormError::Database(format!("Delete failed: {}", e)))
    }
}

/// Duplicate-key violations surface as conflicts, everything else as database errors
fn map_write_error(err: mongodb::error::Error) -> BookwormError {
    let message = err.to_string();
    if message.contains("E11000") {
        BookwormError::Conflict("Duplicate key".into())
    } else {
        BookwormError::Database(format!("Write failed: {}", message))
    }
}

/// Drain a cursor. A document that fails to decode fails the whole read
/// rather than shrinking the result.
async fn collect_documents<T, S>(cursor: S) -> Result<Vec<T>, BookwormError>
where
    S: Stream<Item = mongodb::error::Result<T>>,
{
    cursor.try_collect().await.map_err(|e| {
        error!("Error reading document: {}", e);
        BookwormError::Database(format!("Error reading document: {}", e))
    })
}
