//! Demand ranking and recommendation endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::Book,
        pagination::{BookPage, Pagination, SortPagination},
    },
    AppState,
};

use super::{AuthenticatedUser, ValidatedQuery};

/// Books ranked by demand score
#[utoipa::path(
    get,
    path = "/dataanalysis/approximatedemand",
    tag = "data-analysis",
    security(("bearer_auth" = [])),
    params(Pagination),
    responses(
        (status = 200, description = "Page of books, highest demand first", body = BookPage)
    )
)]
pub async fn books_by_demand(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(page): ValidatedQuery<Pagination>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.data_analysis.books_by_demand(page).await?;
    Ok(Json(page))
}

/// Recommendations seeded from the caller's own lists
#[utoipa::path(
    get,
    path = "/dataanalysis/recommendedbooks",
    tag = "data-analysis",
    security(("bearer_auth" = [])),
    params(SortPagination),
    responses(
        (status = 200, description = "Page of recommended books", body = BookPage)
    )
)]
pub async fn recommended_books(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.data_analysis.recommended_books(user_id, &query).await?;
    Ok(Json(page))
}

/// Books sharing genre or author with the given one
#[utoipa::path(
    get,
    path = "/similarbooks/{isbn}",
    tag = "data-analysis",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Similar books", body = Vec<Book>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn similar_books(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.data_analysis.similar_books(&isbn).await?;
    Ok(Json(books))
}
