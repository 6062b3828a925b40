use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use bookshelf_http::AppError;

use super::BooksState;

pub const INVALID_ID_MESSAGE: &str = "id must be a valid mongo id";
pub const NOT_FOUND_MESSAGE: &str = "Book not found";

/// Existence guard for `/{id}` routes.
///
/// Rejects malformed ids before the store is consulted, then rejects ids with
/// no stored record. On success the parsed [`BookId`](super::models::BookId)
/// is handed on as a request extension; the record itself is not.
pub async fn require_existing_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let id = state.rules.check_id(&raw_id).map_err(|violation| {
        tracing::debug!(id = %raw_id, %violation, "rejecting malformed book id");
        AppError::validation(INVALID_ID_MESSAGE)
    })?;

    if state.store.find_by_id(&id).await?.is_none() {
        tracing::debug!(%id, "book does not exist");
        return Err(AppError::not_found(NOT_FOUND_MESSAGE));
    }

    request.extensions_mut().insert(id);
    Ok(next.run(request).await)
}
