//! Checkout ticket endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        checkout::{CheckoutPage, CheckoutTicketResponse, CreateCheckout, UpdateCheckout},
        pagination::SortPagination,
    },
    AppState,
};

use super::{AuthenticatedUser, ValidatedJson, ValidatedQuery};

/// Reserve a book
#[utoipa::path(
    post,
    path = "/checkouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    request_body = CreateCheckout,
    responses(
        (status = 201, description = "Ticket created", body = CheckoutTicketResponse),
        (status = 400, description = "Payment pending"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "Out of stock or already checked out")
    )
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateCheckout>,
) -> AppResult<(StatusCode, Json<CheckoutTicketResponse>)> {
    let book_id = request
        .book_id
        .ok_or_else(|| state.validator.reject("bookID", "required"))?;
    let user_id = request.user_id.unwrap_or(caller);

    let ticket = state
        .services
        .checkouts
        .create(user_id, book_id, request.number_of_days)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Update a ticket, possibly moving its state
#[utoipa::path(
    put,
    path = "/checkouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    request_body = UpdateCheckout,
    responses(
        (status = 200, description = "Ticket updated", body = CheckoutTicketResponse),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Invalid state transition")
    )
)]
pub async fn update_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateCheckout>,
) -> AppResult<Json<CheckoutTicketResponse>> {
    let id = request.id.ok_or_else(|| state.validator.reject("ID", "required"))?;
    let ticket = state.services.checkouts.update(id, &request).await?;
    Ok(Json(ticket))
}

/// Get a ticket by ID
#[utoipa::path(
    get,
    path = "/checkouts/{checkoutid}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("checkoutid" = Uuid, Path, description = "Checkout ticket ID")),
    responses(
        (status = 200, description = "Ticket", body = CheckoutTicketResponse),
        (status = 404, description = "Ticket not found")
    )
)]
pub async fn get_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CheckoutTicketResponse>> {
    let ticket = state.services.checkouts.get_by_id(id).await?;
    Ok(Json(ticket))
}

/// Delete a ticket
#[utoipa::path(
    delete,
    path = "/checkouts/{checkoutid}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("checkoutid" = Uuid, Path, description = "Checkout ticket ID")),
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 404, description = "Ticket not found")
    )
)]
pub async fn delete_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.checkouts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A user's tickets for one book
#[utoipa::path(
    get,
    path = "/allcheckouts/{bookid}/{userid}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(
        ("bookid" = Uuid, Path, description = "Book ID"),
        ("userid" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Tickets", body = Vec<CheckoutTicketResponse>)
    )
)]
pub async fn get_user_book_checkouts(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path((book_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<CheckoutTicketResponse>>> {
    let tickets = state.services.checkouts.get_by_user_book(book_id, user_id).await?;
    Ok(Json(tickets))
}

/// The authenticated user's tickets
#[utoipa::path(
    get,
    path = "/users/checkouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tickets", body = Vec<CheckoutTicketResponse>)
    )
)]
pub async fn get_my_checkouts(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Vec<CheckoutTicketResponse>>> {
    let tickets = state.services.checkouts.list_for_user(user_id).await?;
    Ok(Json(tickets))
}

/// All tickets with book and borrower
#[utoipa::path(
    get,
    path = "/allcheckouts",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(SortPagination),
    responses(
        (status = 200, description = "Page of tickets", body = CheckoutPage)
    )
)]
pub async fn list_checkouts(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SortPagination>,
) -> AppResult<Json<CheckoutPage>> {
    let page = state.services.checkouts.list_with_details(&query).await?;
    Ok(Json(page))
}
