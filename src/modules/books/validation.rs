use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use bookshelf_http::AppError;
use serde_json::Value;
use time::OffsetDateTime;

use super::{
    models::{BookFields, BookId},
    BooksState,
};
use crate::schema::{FieldRule, ObjectRules, Violation};

pub const MIN_PUBLISH_YEAR: i64 = 1900;

/// Rule sets for book payloads and identifiers, built once and shared.
#[derive(Debug, Clone)]
pub struct BookRules {
    book: ObjectRules,
    id: ObjectRules,
}

impl BookRules {
    /// Rules accepting publish years up to `current_year`.
    pub fn new(current_year: i32) -> Self {
        let book = ObjectRules::new()
            .field(FieldRule::text("title").required().min_length(3).max_length(100))
            .field(FieldRule::text("description").optional().min_length(20).max_length(250))
            .field(FieldRule::text("author").required().min_length(3).max_length(100))
            .field(
                FieldRule::number("publishYear")
                    .required()
                    .integer()
                    .min(MIN_PUBLISH_YEAR)
                    .max(i64::from(current_year)),
            );

        let id = ObjectRules::new().field(FieldRule::text("id").hex().required().length(24));

        Self { book, id }
    }

    /// Rules for the current UTC calendar year.
    pub fn for_current_year() -> Self {
        Self::new(OffsetDateTime::now_utc().year())
    }

    /// Check a decoded body and turn it into typed fields.
    pub fn check_book(&self, body: &Value) -> Result<BookFields, AppError> {
        let normalized = self
            .book
            .validate(body)
            .map_err(|violation| AppError::validation(violation.to_string()))?;

        serde_json::from_value(Value::Object(normalized))
            .map_err(|e| AppError::validation(e.to_string()))
    }

    /// Check an identifier's shape. Says nothing about existence.
    pub fn check_id(&self, id: &str) -> Result<BookId, Violation> {
        self.id.validate(&serde_json::json!({ "id": id }))?;
        id.parse().map_err(|_| Violation::NotHex("id"))
    }
}

/// Middleware rejecting book payloads that break the book rules.
///
/// The typed [`BookFields`] are handed on as a request extension. An empty
/// body counts as `{}`.
pub async fn validate_book(
    State(state): State<BooksState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, state.body_limit).await.map_err(|_| {
        AppError::with_status(StatusCode::PAYLOAD_TOO_LARGE, "request entity too large")
    })?;

    let body: Value = if bytes.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&bytes).map_err(|e| AppError::validation(e.to_string()))?
    };

    let fields = state.rules.check_book(&body)?;

    let mut request = Request::from_parts(parts, Body::empty());
    request.extensions_mut().insert(fields);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> BookRules {
        BookRules::new(2026)
    }

    fn rejection(body: Value) -> String {
        rules().check_book(&body).unwrap_err().to_string()
    }

    #[test]
    fn missing_title_is_required() {
        assert_eq!(
            rejection(json!({"description": "Test Description"})),
            "\"title\" is required"
        );
    }

    #[test]
    fn publish_year_is_capped_at_current_year() {
        assert_eq!(
            rejection(json!({"title": "Test Title", "author": "Test Author", "publishYear": 2030})),
            "\"publishYear\" must be less than or equal to 2026"
        );
        assert_eq!(
            rejection(json!({"title": "Test Title", "author": "Test Author", "publishYear": 1899})),
            "\"publishYear\" must be greater than or equal to 1900"
        );
    }

    #[test]
    fn short_description_is_rejected() {
        assert_eq!(
            rejection(json!({
                "title": "Test Title",
                "description": "Too short",
                "author": "Test Author",
                "publishYear": 2020
            })),
            "\"description\" length must be at least 20 characters long"
        );
    }

    #[test]
    fn valid_payload_becomes_fields() {
        let fields = rules()
            .check_book(&json!({"title": "Test Title", "author": "Test Author", "publishYear": "2020"}))
            .unwrap();
        assert_eq!(
            fields,
            BookFields {
                title: "Test Title".to_string(),
                description: None,
                author: "Test Author".to_string(),
                publish_year: 2020,
            }
        );
    }

    fn book(title: &str, description: &str, author: &str, year: i64) -> Value {
        json!({
            "title": title,
            "description": description,
            "author": author,
            "publishYear": year
        })
    }

    fn text(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn inclusive_bounds_are_accepted() {
        let rules = rules();
        let shortest = book(&text(3), &text(20), &text(3), MIN_PUBLISH_YEAR);
        let longest = book(&text(100), &text(250), &text(100), 2026);

        let fields = rules.check_book(&shortest).unwrap();
        assert_eq!(fields.title.len(), 3);
        assert_eq!(fields.publish_year, 1900);

        let fields = rules.check_book(&longest).unwrap();
        assert_eq!(fields.description.as_deref().map(str::len), Some(250));
        assert_eq!(fields.publish_year, 2026);
    }

    #[test]
    fn one_past_each_bound_is_rejected() {
        let cases = [
            (
                book(&text(2), &text(20), &text(3), 2000),
                "\"title\" length must be at least 3 characters long",
            ),
            (
                book(&text(101), &text(20), &text(3), 2000),
                "\"title\" length must be less than or equal to 100 characters long",
            ),
            (
                book(&text(3), &text(19), &text(3), 2000),
                "\"description\" length must be at least 20 characters long",
            ),
            (
                book(&text(3), &text(251), &text(3), 2000),
                "\"description\" length must be less than or equal to 250 characters long",
            ),
            (
                book(&text(3), &text(20), &text(2), 2000),
                "\"author\" length must be at least 3 characters long",
            ),
            (
                book(&text(3), &text(20), &text(101), 2000),
                "\"author\" length must be less than or equal to 100 characters long",
            ),
            (
                book(&text(3), &text(20), &text(3), 1899),
                "\"publishYear\" must be greater than or equal to 1900",
            ),
            (
                book(&text(3), &text(20), &text(3), 2027),
                "\"publishYear\" must be less than or equal to 2026",
            ),
        ];

        for (body, message) in cases {
            assert_eq!(rejection(body), message);
        }
    }

    #[test]
    fn lengths_count_utf16_units() {
        // Each emoji is two UTF-16 units, so two of them clear the minimum of 3.
        let fields = rules()
            .check_book(&json!({"title": "😀😀", "author": "Test Author", "publishYear": 2020}))
            .unwrap();
        assert_eq!(fields.title, "😀😀");

        assert_eq!(
            rejection(json!({"title": "😀", "author": "Test Author", "publishYear": 2020})),
            "\"title\" length must be at least 3 characters long"
        );
    }

    #[test]
    fn identifier_shape() {
        assert!(rules().check_id("65cfab54334445fc48b1776e").is_ok());
        assert_eq!(
            rules().check_id("invalidId").unwrap_err(),
            Violation::NotHex("id")
        );
        assert_eq!(
            rules().check_id("65cfab54").unwrap_err(),
            Violation::WrongLength {
                field: "id",
                length: 24
            }
        );
        assert_eq!(rules().check_id("").unwrap_err(), Violation::Empty("id"));
    }
}
