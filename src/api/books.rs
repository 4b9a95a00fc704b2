//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AverageRating, Book, CreateBook, UpdateBook},
        pagination::{BookPage, SortPagination},
    },
    AppState,
};

use super::{AuthenticatedUser, ValidatedJson, ValidatedQuery};

/// Create a book, or overwrite the one with the same ISBN
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book stored", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ValidationErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(book): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.books.create(&book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Create or overwrite a batch of books in one transaction
#[utoipa::path(
    post,
    path = "/allbooks",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = Vec<CreateBook>,
    responses(
        (status = 201, description = "Books stored", body = Vec<Book>),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_books(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Json(books): Json<Vec<CreateBook>>,
) -> AppResult<(StatusCode, Json<Vec<Book>>)> {
    if books.is_empty() {
        return Err(AppError::BadRequest("at least one book is required".to_string()));
    }
    for book in &books {
        state.validator.validate(book)?;
    }

    let books = state.services.books.create_many(&books).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

/// Get a book by ISBN, counting the caller as a viewer
#[utoipa::path(
    get,
    path = "/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_isbn(&isbn, user_id).await?;
    Ok(Json(book))
}

/// Rating histogram of a book
#[utoipa::path(
    get,
    path = "/books/{isbn}/ratings",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Rating histogram", body = AverageRating),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book_ratings(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<AverageRating>> {
    let rating = state.services.books.ratings(&isbn).await?;
    Ok(Json(rating))
}

/// List local books
#[utoipa::path(
    get,
    path = "/allbooks",
    tag = "books",
    security(("bearer_auth" = [])),
    params(SortPagination),
    responses(
        (status = 200, description = "Page of books", body = BookPage),
        (status = 400, description = "Invalid pagination")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.books.list(&query).await?;
    Ok(Json(page))
}

/// Newest books from the external catalog
#[utoipa::path(
    get,
    path = "/newbooks",
    tag = "books",
    security(("bearer_auth" = [])),
    params(SortPagination),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn new_books(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.books.new_books(&query).await?;
    Ok(Json(page))
}

/// Update a book by ISBN
#[utoipa::path(
    put,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(book): ValidatedJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.update(&book).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.books.delete(book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a book to the caller's wishlist
#[utoipa::path(
    post,
    path = "/books/{isbn}/wishlist",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Book wishlisted", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.add_to_wishlist(user_id, &isbn).await?;
    Ok(Json(book))
}
