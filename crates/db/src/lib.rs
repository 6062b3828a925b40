//! Document store connection factory.
//!
//! A configured `database.uri` selects MongoDB; without one the service keeps
//! its records in process memory.

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, Client};

/// Backend chosen at startup. Modules open their own collections from it.
#[derive(Debug, Clone)]
pub enum DocumentStore {
    InMemory,
    Mongo(mongodb::Database),
}

impl DocumentStore {
    /// Short backend label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentStore::InMemory => "memory",
            DocumentStore::Mongo(_) => "mongodb",
        }
    }
}

/// Connect to the configured backend. MongoDB connections are pinged so a
/// bad uri fails startup rather than the first request.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DocumentStore> {
    let Some(uri) = settings.uri.as_deref() else {
        tracing::info!(target: "bookshelf-db", "no database uri configured, using in-process store");
        return Ok(DocumentStore::InMemory);
    };

    let client = Client::with_uri_str(uri)
        .await
        .context("failed to parse MongoDB connection string")?;
    let database = client.database(&settings.name);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("failed to reach MongoDB database '{}'", settings.name))?;

    tracing::info!(target: "bookshelf-db", database = %settings.name, "connected to MongoDB");
    Ok(DocumentStore::Mongo(database))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_uri_selects_in_process_store() {
        let store = connect(&DatabaseSettings::default()).await.unwrap();
        assert_eq!(store.kind(), "memory");
    }

    #[tokio::test]
    async fn malformed_uri_is_rejected() {
        let settings = DatabaseSettings {
            uri: Some("not-a-mongo-uri".to_string()),
            ..DatabaseSettings::default()
        };
        assert!(connect(&settings).await.is_err());
    }
}
