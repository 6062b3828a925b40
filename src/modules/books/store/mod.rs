//! Persistence for book records.
//!
//! [`BookStore`] is the seam between the HTTP handlers and the document
//! store. Identifiers reaching it have already been checked for shape.

mod memory;
mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_db::DocumentStore;
use bookshelf_http::AppError;
use bookshelf_kernel::settings::DatabaseSettings;
use thiserror::Error;

use super::models::{Book, BookFields, BookId};

pub use memory::MemoryBookStore;
pub use mongo::MongoBookStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("stored book {id} is unreadable: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.into())
    }
}

/// Result of an update; handlers do not inspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
}

/// Result of a delete; handlers do not inspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new record, assigning its id and timestamps.
    async fn insert(&self, fields: BookFields) -> StoreResult<Book>;

    /// Every record, in the order the backend returns them.
    async fn find_all(&self) -> StoreResult<Vec<Book>>;

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<Book>>;

    /// Overwrite the four mutable fields and bump `updatedAt`.
    async fn update_by_id(&self, id: &BookId, fields: BookFields) -> StoreResult<UpdateOutcome>;

    async fn delete_by_id(&self, id: &BookId) -> StoreResult<DeleteOutcome>;
}

/// Open the book collection on the configured backend.
pub fn open(store: &DocumentStore, settings: &DatabaseSettings) -> Arc<dyn BookStore> {
    match store {
        DocumentStore::InMemory => Arc::new(MemoryBookStore::new()),
        DocumentStore::Mongo(database) => {
            Arc::new(MongoBookStore::new(database, &settings.collection))
        }
    }
}
