//! Librarian dashboard endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        book::Book,
        dashboard::{DataBoard, LineGraphPoint},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Monthly new users and checkouts over the last months
#[utoipa::path(
    get,
    path = "/dashboards/linegraph",
    tag = "dashboards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One point per month, oldest first", body = Vec<LineGraphPoint>)
    )
)]
pub async fn line_graph(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> AppResult<Json<Vec<LineGraphPoint>>> {
    let points = state.services.dashboards.line_graph().await?;
    Ok(Json(points))
}

/// Library-wide counters
#[utoipa::path(
    get,
    path = "/dashboards/databoard",
    tag = "dashboards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Totals and this month's figures", body = DataBoard)
    )
)]
pub async fn data_board(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> AppResult<Json<DataBoard>> {
    let board = state.services.dashboards.data_board().await?;
    Ok(Json(board))
}

/// Most wishlisted books
#[utoipa::path(
    get,
    path = "/dashboards/highdemand",
    tag = "dashboards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "High demand books", body = Vec<Book>)
    )
)]
pub async fn high_demand(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.dashboards.high_demand().await?;
    Ok(Json(books))
}
