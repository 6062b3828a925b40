//! Shared helpers for the HTTP-level tests.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use bookshelf_app::modules::books::{
    models::{Book, BookFields, BookId},
    store::{BookStore, DeleteOutcome, MemoryBookStore, StoreError, StoreResult, UpdateOutcome},
};
use bookshelf_http::App;
use bookshelf_kernel::settings::{Environment, Settings};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const MISSING_ID: &str = "65cfab54334445fc48b1776e";

pub fn settings(environment: Environment) -> Settings {
    Settings {
        environment,
        ..Settings::default()
    }
}

pub fn app_with(store: Arc<dyn BookStore>) -> App {
    bookshelf_app::app(store, &settings(Environment::Test))
}

pub fn app() -> App {
    app_with(Arc::new(MemoryBookStore::new()))
}

pub fn valid_book() -> Value {
    json!({
        "title": "Test Title",
        "description": "A description that is long enough",
        "author": "Test Author",
        "publishYear": 2020
    })
}

pub async fn send(app: &App, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    send_request(app, request).await
}

pub async fn send_request(app: &App, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

/// Creates a valid book and returns its id.
pub async fn create_book(app: &App) -> String {
    let (status, body) = send(app, "POST", "/books", Some(valid_book())).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["_id"].as_str().unwrap().to_string()
}

/// Memory store that counts every call reaching it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryBookStore,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookStore for CountingStore {
    async fn insert(&self, fields: BookFields) -> StoreResult<Book> {
        self.tick();
        self.inner.insert(fields).await
    }

    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        self.tick();
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<Book>> {
        self.tick();
        self.inner.find_by_id(id).await
    }

    async fn update_by_id(&self, id: &BookId, fields: BookFields) -> StoreResult<UpdateOutcome> {
        self.tick();
        self.inner.update_by_id(id, fields).await
    }

    async fn delete_by_id(&self, id: &BookId) -> StoreResult<DeleteOutcome> {
        self.tick();
        self.inner.delete_by_id(id).await
    }
}

/// Store whose every call fails.
pub struct FailingStore;

fn failure() -> StoreError {
    StoreError::Corrupt {
        id: MISSING_ID.to_string(),
        reason: "connection reset".to_string(),
    }
}

#[async_trait]
impl BookStore for FailingStore {
    async fn insert(&self, _fields: BookFields) -> StoreResult<Book> {
        Err(failure())
    }

    async fn find_all(&self) -> StoreResult<Vec<Book>> {
        Err(failure())
    }

    async fn find_by_id(&self, _id: &BookId) -> StoreResult<Option<Book>> {
        Err(failure())
    }

    async fn update_by_id(&self, _id: &BookId, _fields: BookFields) -> StoreResult<UpdateOutcome> {
        Err(failure())
    }

    async fn delete_by_id(&self, _id: &BookId) -> StoreResult<DeleteOutcome> {
        Err(failure())
    }
}
