use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, DateTime};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{BookStore, DeleteOutcome, StoreError, StoreResult, UpdateOutcome};
use crate::modules::books::models::{Book, BookFields, BookId};

/// Stored shape of a book; timestamps are BSON dates.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    author: String,
    publish_year: i32,
    created_at: DateTime,
    updated_at: DateTime,
}

impl BookDocument {
    fn new(fields: BookFields, now: DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            title: fields.title,
            description: fields.description,
            author: fields.author,
            publish_year: fields.publish_year,
            created_at: now,
            updated_at: now,
        }
    }

    fn into_book(self) -> StoreResult<Book> {
        Ok(Book {
            id: BookId::from(self.id),
            created_at: from_bson_date(&self.id, self.created_at)?,
            updated_at: from_bson_date(&self.id, self.updated_at)?,
            title: self.title,
            description: self.description,
            author: self.author,
            publish_year: self.publish_year,
        })
    }
}

fn from_bson_date(id: &ObjectId, at: DateTime) -> StoreResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at.timestamp_millis()) * 1_000_000)
        .map_err(|e| StoreError::Corrupt {
            id: id.to_hex(),
            reason: e.to_string(),
        })
}

/// Book collection in MongoDB.
#[derive(Debug, Clone)]
pub struct MongoBookStore {
    collection: Collection<BookDocument>,
}

impl MongoBookStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, fields: BookFields) -> StoreResult<Book> {
        let document = BookDocument::new(fields, DateTime::now());
        self.collection.insert_one(&document).await?;
        document.into_book()
    }

    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        self.collection
            .find(doc! {})
            .await?
            .try_collect::<Vec<BookDocument>>()
            .await?
            .into_iter()
            .map(BookDocument::into_book)
            .collect()
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<Book>> {
        self.collection
            .find_one(doc! { "_id": id.object_id() })
            .await?
            .map(BookDocument::into_book)
            .transpose()
    }

    async fn update_by_id(&self, id: &BookId, fields: BookFields) -> StoreResult<UpdateOutcome> {
        let mut set = doc! {
            "title": fields.title,
            "author": fields.author,
            "publishYear": fields.publish_year,
            "updatedAt": DateTime::now(),
        };
        let update = match fields.description {
            Some(description) => {
                set.insert("description", Bson::String(description));
                doc! { "$set": set }
            }
            None => doc! { "$set": set, "$unset": { "description": "" } },
        };

        let result = self
            .collection
            .update_one(doc! { "_id": id.object_id() }, update)
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
        })
    }

    async fn delete_by_id(&self, id: &BookId) -> StoreResult<DeleteOutcome> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() })
            .await?;

        Ok(DeleteOutcome {
            deleted: result.deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> BookDocument {
        BookDocument::new(
            BookFields {
                title: "Dune".to_string(),
                description: None,
                author: "Frank Herbert".to_string(),
                publish_year: 1965,
            },
            DateTime::from_millis(1_700_000_000_123),
        )
    }

    #[test]
    fn documents_convert_to_books() {
        let document = document();
        let id = document.id;

        let book = document.into_book().unwrap();
        assert_eq!(book.id.object_id(), id);
        assert_eq!(book.created_at, book.updated_at);
        assert_eq!(book.created_at.unix_timestamp(), 1_700_000_000);
        assert_eq!(book.created_at.millisecond(), 123);
    }

    #[test]
    fn stored_shape_uses_document_field_names() {
        let stored = bson::to_document(&document()).unwrap();
        assert!(stored.contains_key("_id"));
        assert!(stored.contains_key("publishYear"));
        assert!(stored.contains_key("createdAt"));
        assert!(!stored.contains_key("description"));
    }
}
