pub mod guard;
pub mod handlers;
pub mod models;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use bookshelf_kernel::{settings::Settings, InitCtx, Module};
use serde_json::json;

use store::BookStore;
use validation::BookRules;

/// Shared, read-only state of the books routes.
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
    pub rules: Arc<BookRules>,
    pub body_limit: usize,
}

/// Books module: CRUD over the book collection, mounted under `/books`
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, rules: BookRules, body_limit: usize) -> Self {
        Self {
            state: BooksState {
                store,
                rules: Arc::new(rules),
                body_limit,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    /// Route chains, outermost layer first. Layers only run for matched
    /// methods, so method mismatches fall through to the not-found envelope.
    ///
    /// | route | chain |
    /// |---|---|
    /// | `POST /` | validate → create |
    /// | `GET /` | list |
    /// | `GET /{id}` | guard → get |
    /// | `PUT /{id}` | validate → guard → update |
    /// | `DELETE /{id}` | guard → delete |
    fn routes(&self) -> Router {
        let validate = middleware::from_fn_with_state(self.state.clone(), validation::validate_book);
        let guard = middleware::from_fn_with_state(self.state.clone(), guard::require_existing_book);

        Router::new()
            .route(
                "/",
                get(handlers::list_books)
                    .merge(post(handlers::create_book).route_layer(validate.clone())),
            )
            .route(
                "/{id}",
                get(handlers::get_book)
                    .route_layer(guard.clone())
                    .merge(
                        put(handlers::update_book)
                            .route_layer(guard.clone())
                            .route_layer(validate),
                    )
                    .merge(delete(handlers::delete_book).route_layer(guard)),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorEnvelope" }
                    }
                }
            })
        };
        let success = |description: &str, data: &serde_json::Value| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": {
                                "success": { "type": "boolean", "enum": [true] },
                                "message": { "type": "string" },
                                "data": data
                            },
                            "required": ["success", "message", "data"]
                        }
                    }
                }
            })
        };
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let nullable_book = json!({ "allOf": [book_ref.clone()], "nullable": true });
        let input = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": success("Books fetched successfully", &json!({ "type": "array", "items": book_ref })),
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": input,
                        "responses": {
                            "201": success("Book created successfully", &book_ref),
                            "400": error("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_param,
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": success("Book fetched successfully", &nullable_book),
                            "400": error("Malformed id"),
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book's fields",
                        "tags": ["Books"],
                        "requestBody": input,
                        "responses": {
                            "200": success("Book updated successfully", &nullable_book),
                            "400": error("Validation error or malformed id"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": success("Book deleted successfully", &json!({ "nullable": true })),
                            "400": error("Malformed id"),
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string", "description": "Store-assigned identifier" },
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "author": { "type": "string" },
                            "publishYear": { "type": "integer" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["_id", "title", "author", "publishYear", "createdAt", "updatedAt"]
                    },
                    "BookInput": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "title": { "type": "string", "minLength": 3, "maxLength": 100 },
                            "description": { "type": "string", "minLength": 20, "maxLength": 250 },
                            "author": { "type": "string", "minLength": 3, "maxLength": 100 },
                            "publishYear": { "type": "integer", "minimum": validation::MIN_PUBLISH_YEAR }
                        },
                        "required": ["title", "author", "publishYear"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over `store`, with rules for the current year
pub fn create_module(store: Arc<dyn BookStore>, settings: &Settings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(
        store,
        BookRules::for_current_year(),
        settings.server.body_limit_bytes,
    ))
}
