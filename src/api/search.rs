//! Search endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::search::SearchQuery, services::search::SearchResults, AppState};

use super::{AuthenticatedUser, ValidatedQuery};

/// Search books (external catalog first) or users
#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    security(("bearer_auth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books or users", body = SearchResults),
        (status = 400, description = "Invalid query", body = crate::error::ValidationErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> AppResult<Json<SearchResults>> {
    let kind = query.kind().ok_or_else(|| state.validator.reject("type", "oneof"))?;
    let results = state.services.search.search(kind, &query).await?;
    Ok(Json(results))
}
