//! Persistence for Bookworm
//!
//! MongoDB collections behind the [`CatalogStore`] trait, plus an in-memory
//! implementation for dev mode and tests.

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod schemas;
pub mod store;

pub use memory::MemoryCatalogStore;
pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use mongo_store::MongoCatalogStore;
pub use store::CatalogStore;
