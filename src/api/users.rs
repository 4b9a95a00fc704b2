//! User account endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookDetailsFrom},
        enums::Genre,
        pagination::SortPagination,
        user::{
            BookDetails, LoginResponse, LoginUser, RegisterUser, UpdateBookDetails, UpdateUser, User, UserPage,
            UserWithBookDetails,
        },
    },
    AppState,
};

use super::{AuthenticatedUser, ValidatedJson, ValidatedQuery};

/// Register a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ValidationErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginUser,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Wrong password", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown email", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginUser>,
) -> AppResult<Json<LoginResponse>> {
    let response = state.services.users.login(request).await?;
    Ok(Json(response))
}

/// The authenticated user with their book ledger
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserWithBookDetails),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<UserWithBookDetails>> {
    let user = state.services.users.get_by_id(user_id).await?;
    Ok(Json(user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{userid}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("userid" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserWithBookDetails),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserWithBookDetails>> {
    let user = state.services.users.get_by_id(user_id).await?;
    Ok(Json(user))
}

/// List users
#[utoipa::path(
    get,
    path = "/allusers",
    tag = "users",
    security(("bearer_auth" = [])),
    params(SortPagination),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 400, description = "Invalid pagination")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<UserPage>> {
    let page = state.services.users.list(&query).await?;
    Ok(Json(page))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateUser>,
) -> AppResult<Json<User>> {
    let user = state.services.users.update(user_id, &request).await?;
    Ok(Json(user))
}

/// Replace the authenticated user's book ledger
#[utoipa::path(
    put,
    path = "/users/book-details",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateBookDetails,
    responses(
        (status = 200, description = "Book details updated", body = BookDetails),
        (status = 400, description = "Unknown genre")
    )
)]
pub async fn update_book_details(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateBookDetails>,
) -> AppResult<Json<BookDetails>> {
    let genres = request
        .favorite_genres
        .iter()
        .map(|g| g.parse::<Genre>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| state.validator.reject("favoriteGenres", "oneof"))?;

    let details = state
        .services
        .users
        .update_book_details(user_id, &request, &genres)
        .await?;
    Ok(Json(details))
}

/// Delete the authenticated user's account
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<StatusCode> {
    state.services.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Books in one of the authenticated user's lists
#[utoipa::path(
    get,
    path = "/users/books/{bookdetailsfrom}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("bookdetailsfrom" = String, Path, description = "reserved, pending, checkedout, completed or wishlists")),
    responses(
        (status = 200, description = "Books of the list", body = Vec<Book>)
    )
)]
pub async fn get_my_books(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(from): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .services
        .users
        .books_from(user_id, BookDetailsFrom::parse(&from))
        .await?;
    Ok(Json(books))
}
