//! Review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        pagination::SortPagination,
        review::{CreateReview, Review, ReviewPage, UpdateReview},
    },
    repository::reviews::NewReview,
    AppState,
};

use super::{AuthenticatedUser, ValidatedJson, ValidatedQuery};

/// Post the review of a checkout, overwriting an earlier one
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review stored", body = Review),
        (status = 400, description = "Invalid input", body = crate::error::ValidationErrorResponse),
        (status = 404, description = "Book or checkout not found")
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let book_id = request
        .book_id
        .ok_or_else(|| state.validator.reject("bookID", "required"))?;
    let checkout_id = request
        .checkout_id
        .ok_or_else(|| state.validator.reject("checkoutID", "required"))?;
    let rating = request
        .rating
        .ok_or_else(|| state.validator.reject("rating", "required"))?;

    let review = state
        .services
        .reviews
        .create(NewReview {
            book_id,
            checkout_id,
            user_id: request.user_id.unwrap_or(caller),
            comment_heading: request.comment_heading,
            comment: request.comment,
            rating,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Get a review by ID
#[utoipa::path(
    get,
    path = "/reviews/{reviewid}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("reviewid" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 404, description = "Review not found")
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.get_by_id(id).await?;
    Ok(Json(review))
}

/// Reviews of one book
#[utoipa::path(
    get,
    path = "/allreviews/{bookid}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("bookid" = Uuid, Path, description = "Book ID"),
        SortPagination
    ),
    responses(
        (status = 200, description = "Page of reviews", body = ReviewPage)
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<ReviewPage>> {
    let page = state.services.reviews.list_by_book(book_id, &query).await?;
    Ok(Json(page))
}

/// Edit a review
#[utoipa::path(
    put,
    path = "/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateReview>,
) -> AppResult<Json<Review>> {
    let id = request.id.ok_or_else(|| state.validator.reject("ID", "required"))?;
    let review = state.services.reviews.update(id, &request).await?;
    Ok(Json(review))
}

/// Delete a review
#[utoipa::path(
    delete,
    path = "/reviews/{reviewid}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("reviewid" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.reviews.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
