use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{BookStore, DeleteOutcome, StoreResult, UpdateOutcome};
use crate::modules::books::models::{Book, BookFields, BookId};

/// In-process book collection.
///
/// Clones share the same records. Records are kept in insertion order; lookups
/// scan, which is fine for the collection sizes this backend serves.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookStore {
    books: Arc<RwLock<Vec<Book>>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, fields: BookFields) -> StoreResult<Book> {
        let book = Book::new(BookId::generate(), fields, OffsetDateTime::now_utc());
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<Book>> {
        Ok(self.books.read().await.iter().find(|book| book.id == *id).cloned())
    }

    async fn update_by_id(&self, id: &BookId, fields: BookFields) -> StoreResult<UpdateOutcome> {
        let mut books = self.books.write().await;
        let matched = match books.iter_mut().find(|book| book.id == *id) {
            Some(book) => {
                book.overwrite(fields, OffsetDateTime::now_utc());
                1
            }
            None => 0,
        };
        Ok(UpdateOutcome { matched })
    }

    async fn delete_by_id(&self, id: &BookId) -> StoreResult<DeleteOutcome> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|book| book.id != *id);
        let deleted = (before - books.len()) as u64;
        Ok(DeleteOutcome { deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> BookFields {
        BookFields {
            title: title.to_string(),
            description: Some("A story told over many long chapters".to_string()),
            author: "Test Author".to_string(),
            publish_year: 2020,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryBookStore::new();
        let book = store.insert(fields("First")).await.unwrap();

        assert_eq!(book.created_at, book.updated_at);
        assert_eq!(store.find_by_id(&book.id).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryBookStore::new();
        for title in ["First", "Second", "Third"] {
            store.insert(fields(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn update_reports_matches_without_failing_on_missing_ids() {
        let store = MemoryBookStore::new();
        let book = store.insert(fields("First")).await.unwrap();

        let outcome = store
            .update_by_id(
                &book.id,
                BookFields {
                    description: None,
                    ..fields("Renamed")
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1 });

        let stored = store.find_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.description, None);
        assert_eq!(stored.created_at, book.created_at);
        assert!(stored.updated_at >= book.updated_at);

        let missing = store
            .update_by_id(&BookId::generate(), fields("Ghost"))
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome { matched: 0 });
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryBookStore::new();
        let book = store.insert(fields("First")).await.unwrap();

        assert_eq!(
            store.delete_by_id(&book.id).await.unwrap(),
            DeleteOutcome { deleted: 1 }
        );
        assert_eq!(
            store.delete_by_id(&book.id).await.unwrap(),
            DeleteOutcome { deleted: 0 }
        );
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
