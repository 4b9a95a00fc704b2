//! API handlers for the library REST endpoints

pub mod books;
pub mod checkouts;
pub mod dashboards;
pub mod data_analysis;
pub mod health;
pub mod openapi;
pub mod reviews;
pub mod search;
pub mod users;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, rejection::QueryRejection, FromRequest, FromRequestParts, Query, Request},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, models::user::UserClaims, AppState};

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor for the authenticated user id carried by the bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

/// Resolve the user id of an `Authorization` header value
pub fn user_id_from_header(header: Option<&str>, secret: &str) -> Result<Uuid, AppError> {
    let header = header.ok_or_else(|| AppError::Authentication("Unauthorized. Bearer token required.".to_string()))?;

    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AppError::Authentication("Unauthorized: token string should start with 'Bearer '".to_string())
    })?;

    let claims = UserClaims::from_token(token.trim(), secret).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Authentication("token has expired".to_string())
        }
        _ => AppError::Authentication(format!("Unauthorized: {}", e)),
    })?;

    if claims.sub.trim().is_empty() {
        return Err(AppError::Authentication("userID not present in token".to_string()));
    }

    Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Authentication("Unauthorized: userID in token is not a valid id".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
        let user_id = user_id_from_header(header, &state.config.auth.jwt_secret)?;
        Ok(AuthenticatedUser(user_id))
    }
}

/// JSON body checked by the application's [`crate::validation::RequestValidator`]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::field("body", e.body_text()))?;

        state.validator.validate(&value)?;
        Ok(ValidatedJson(value))
    }
}

/// Query string checked by the application's [`crate::validation::RequestValidator`]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T> FromRequestParts<AppState> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::field("query", e.body_text()))?;

        state.validator.validate(&value)?;
        Ok(ValidatedQuery(value))
    }
}

/// Routes mounted under the configured base path
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Users
        .route("/users", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users", get(users::get_me))
        .route("/users", put(users::update_me))
        .route("/users", delete(users::delete_me))
        .route("/users/book-details", put(users::update_book_details))
        .route("/users/books/:bookdetailsfrom", get(users::get_my_books))
        .route("/users/checkouts", get(checkouts::get_my_checkouts))
        .route("/users/:userid", get(users::get_user))
        .route("/allusers", get(users::list_users))
        // Books
        .route("/books", post(books::create_book))
        .route("/books", put(books::update_book))
        .route("/allbooks", post(books::create_books))
        .route("/allbooks", get(books::list_books))
        .route("/books/:isbn", get(books::get_book))
        .route("/books/:isbn/ratings", get(books::get_book_ratings))
        .route("/books/:isbn/wishlist", post(books::add_to_wishlist))
        // Same capture name as the ISBN routes, the segment holds the book id
        .route("/books/:isbn", delete(books::delete_book))
        .route("/newbooks", get(books::new_books))
        .route("/similarbooks/:isbn", get(data_analysis::similar_books))
        // Checkouts
        .route("/checkouts", post(checkouts::create_checkout))
        .route("/checkouts", put(checkouts::update_checkout))
        .route("/checkouts/:checkoutid", get(checkouts::get_checkout))
        .route("/checkouts/:checkoutid", delete(checkouts::delete_checkout))
        .route("/allcheckouts/:bookid/:userid", get(checkouts::get_user_book_checkouts))
        .route("/allcheckouts", get(checkouts::list_checkouts))
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route("/reviews", put(reviews::update_review))
        .route("/reviews/:reviewid", get(reviews::get_review))
        .route("/reviews/:reviewid", delete(reviews::delete_review))
        .route("/allreviews/:bookid", get(reviews::list_reviews))
        // Search
        .route("/search", get(search::search))
        // Data analysis
        .route("/dataanalysis/approximatedemand", get(data_analysis::books_by_demand))
        .route("/dataanalysis/recommendedbooks", get(data_analysis::recommended_books))
        // Dashboards
        .route("/dashboards/linegraph", get(dashboards::line_graph))
        .route("/dashboards/databoard", get(dashboards::data_board))
        .route("/dashboards/highdemand", get(dashboards::high_demand))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::{body::Body, http::Request as HttpRequest, http::StatusCode};
    use tower::ServiceExt;

    use crate::{
        config::AppConfig,
        repository::Repository,
        services::{google_books::GoogleBooksClient, Services},
        validation::RequestValidator,
    };

    const SECRET: &str = "test-secret";

    /// Router over a lazy pool; requests rejected before any query never touch the database
    fn test_router() -> Router {
        let config = AppConfig::default();
        let pool = sqlx::PgPool::connect_lazy(&config.database.url).unwrap();
        let catalog = GoogleBooksClient::new(&config.google_books).unwrap();
        let services = Services::new(Repository::new(pool), config.auth.clone(), Arc::new(catalog));

        routes(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
            validator: Arc::new(RequestValidator::new()),
        })
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        test_router().oneshot(request).await.unwrap().status()
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Authentication(message) => message,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_header() {
        let err = user_id_from_header(None, SECRET).unwrap_err();
        assert_eq!(message(err), "Unauthorized. Bearer token required.");
    }

    #[test]
    fn test_missing_bearer_prefix() {
        let err = user_id_from_header(Some("Token abc"), SECRET).unwrap_err();
        assert_eq!(message(err), "Unauthorized: token string should start with 'Bearer '");
    }

    #[test]
    fn test_bad_signature() {
        let token = UserClaims::new(Uuid::new_v4(), 1).create_token("other-secret").unwrap();
        let err = user_id_from_header(Some(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert!(message(err).starts_with("Unauthorized: "));
    }

    #[test]
    fn test_expired_token() {
        let mut claims = UserClaims::new(Uuid::new_v4(), 1);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = claims.create_token(SECRET).unwrap();

        let err = user_id_from_header(Some(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert_eq!(message(err), "token has expired");
    }

    #[test]
    fn test_empty_subject() {
        let mut claims = UserClaims::new(Uuid::new_v4(), 1);
        claims.sub = String::new();
        let token = claims.create_token(SECRET).unwrap();

        let err = user_id_from_header(Some(&format!("Bearer {}", token)), SECRET).unwrap_err();
        assert_eq!(message(err), "userID not present in token");
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let token = UserClaims::new(user_id, 1).create_token(SECRET).unwrap();

        assert_eq!(
            user_id_from_header(Some(&format!("Bearer {}", token)), SECRET).unwrap(),
            user_id
        );
    }

    #[tokio::test]
    async fn test_listing_routes_require_auth() {
        let book_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        for (method, uri) in [
            ("GET", format!("/allcheckouts/{}/{}", book_id, user_id)),
            ("GET", "/allcheckouts?page=1&limit=5".to_string()),
            ("GET", format!("/checkouts/{}", book_id)),
            ("DELETE", format!("/checkouts/{}", book_id)),
            ("GET", "/dataanalysis/approximatedemand?page=1&limit=5".to_string()),
            ("GET", "/dataanalysis/recommendedbooks?page=1&limit=5".to_string()),
            ("DELETE", format!("/books/{}", book_id)),
        ] {
            assert_eq!(status_of(method, &uri).await, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_routes_are_not_found() {
        let book_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert_eq!(
            status_of("GET", &format!("/checkouts/{}/{}", book_id, user_id)).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of("GET", "/dataanalysis/booksbydemand?page=1&limit=5").await,
            StatusCode::NOT_FOUND
        );
    }
}
