use axum::{extract::State, http::StatusCode, Extension};
use bookshelf_http::{AppError, Success};

use super::{
    models::{Book, BookFields, BookId},
    BooksState,
};

/// `POST /books`, after payload validation.
pub async fn create_book(
    State(state): State<BooksState>,
    Extension(fields): Extension<BookFields>,
) -> Result<Success<Book>, AppError> {
    let book = state.store.insert(fields).await?;
    tracing::info!(id = %book.id, "book created");

    Ok(Success::new("Book created successfully")
        .with_data(book)
        .with_status(StatusCode::CREATED))
}

/// `GET /books`
pub async fn list_books(State(state): State<BooksState>) -> Result<Success<Vec<Book>>, AppError> {
    let books = state.store.find_all().await?;
    Ok(Success::new("Books fetched successfully").with_data(books))
}

/// `GET /books/{id}`, after the existence guard. A record removed since the
/// guard ran is reported as `data: null`.
pub async fn get_book(
    State(state): State<BooksState>,
    Extension(id): Extension<BookId>,
) -> Result<Success<Option<Book>>, AppError> {
    let book = state.store.find_by_id(&id).await?;
    Ok(Success::new("Book fetched successfully").with_data(book))
}

/// `PUT /books/{id}`, after validation and the existence guard.
pub async fn update_book(
    State(state): State<BooksState>,
    Extension(id): Extension<BookId>,
    Extension(fields): Extension<BookFields>,
) -> Result<Success<Option<Book>>, AppError> {
    state.store.update_by_id(&id, fields).await?;
    tracing::info!(%id, "book updated");

    let book = state.store.find_by_id(&id).await?;
    Ok(Success::new("Book updated successfully").with_data(book))
}

/// `DELETE /books/{id}`, after the existence guard.
pub async fn delete_book(
    State(state): State<BooksState>,
    Extension(id): Extension<BookId>,
) -> Result<Success<()>, AppError> {
    state.store.delete_by_id(&id).await?;
    tracing::info!(%id, "book deleted");

    Ok(Success::new("Book deleted successfully"))
}
