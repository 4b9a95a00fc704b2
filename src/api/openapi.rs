//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, checkouts, dashboards, data_analysis, health, reviews, search, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ILM API",
        version = "1.0.0",
        description = "Integrated library management REST API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/ilm-service/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Users
        users::register,
        users::login,
        users::get_me,
        users::get_user,
        users::list_users,
        users::update_me,
        users::update_book_details,
        users::delete_me,
        users::get_my_books,
        // Books
        books::create_book,
        books::create_books,
        books::get_book,
        books::get_book_ratings,
        books::list_books,
        books::new_books,
        books::update_book,
        books::delete_book,
        books::add_to_wishlist,
        // Checkouts
        checkouts::create_checkout,
        checkouts::update_checkout,
        checkouts::get_checkout,
        checkouts::delete_checkout,
        checkouts::get_user_book_checkouts,
        checkouts::get_my_checkouts,
        checkouts::list_checkouts,
        // Reviews
        reviews::create_review,
        reviews::get_review,
        reviews::list_reviews,
        reviews::update_review,
        reviews::delete_review,
        // Search
        search::search,
        // Data analysis
        data_analysis::books_by_demand,
        data_analysis::recommended_books,
        data_analysis::similar_books,
        // Dashboards
        dashboards::line_graph,
        dashboards::data_board,
        dashboards::high_demand,
    ),
    components(
        schemas(
            health::HealthResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::UserPage,
            crate::models::user::UserWithBookDetails,
            crate::models::user::BookDetails,
            crate::models::user::RegisterUser,
            crate::models::user::LoginUser,
            crate::models::user::LoginResponse,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateBookDetails,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::BookDetailsFrom,
            crate::models::book::RatingHistogram,
            crate::models::book::AverageRating,
            crate::models::pagination::BookPage,
            // Checkouts
            crate::models::checkout::CheckoutTicketResponse,
            crate::models::checkout::CheckoutTicketDetails,
            crate::models::checkout::CheckoutPage,
            crate::models::checkout::CreateCheckout,
            crate::models::checkout::UpdateCheckout,
            // Reviews
            crate::models::review::Review,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            crate::models::review::ReviewPage,
            // Search
            crate::models::search::SearchType,
            crate::services::search::SearchResults,
            // Dashboards
            crate::models::dashboard::LineGraphPoint,
            crate::models::dashboard::DataBoard,
            // Enums
            crate::models::enums::Role,
            crate::models::enums::Genre,
            crate::models::enums::CheckoutState,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ValidationErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "User accounts and book ledgers"),
        (name = "books", description = "Book catalog"),
        (name = "checkouts", description = "Reservations, checkouts and returns"),
        (name = "reviews", description = "Book reviews and ratings"),
        (name = "search", description = "Book and user search"),
        (name = "data-analysis", description = "Demand ranking and recommendations"),
        (name = "dashboards", description = "Librarian dashboards")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
