use std::{fmt, str::FromStr};

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

/// Store-assigned book identifier, a 24 character hex object id on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookId(ObjectId);

impl BookId {
    /// Fresh identifier; ids from one process sort in creation order.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for BookId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl FromStr for BookId {
    type Err = bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s).map(Self)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author: String,
    pub publish_year: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The four client-writable fields, used by both create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub author: String,
    pub publish_year: i32,
}

impl Book {
    /// A new record stamped with `now` for both timestamps.
    pub fn new(id: BookId, fields: BookFields, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            author: fields.author,
            publish_year: fields.publish_year,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every mutable field; an absent description clears it.
    pub fn overwrite(&mut self, fields: BookFields, now: OffsetDateTime) {
        self.title = fields.title;
        self.description = fields.description;
        self.author = fields.author;
        self.publish_year = fields.publish_year;
        self.updated_at = now;
    }
}
