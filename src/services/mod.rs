//! Business logic services

pub mod books;
pub mod checkouts;
pub mod dashboards;
pub mod data_analysis;
pub mod google_books;
pub mod ratings;
pub mod reviews;
pub mod search;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

use google_books::CatalogClient;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub checkouts: checkouts::CheckoutsService,
    pub reviews: reviews::ReviewsService,
    pub data_analysis: data_analysis::DataAnalysisService,
    pub dashboards: dashboards::DashboardsService,
    pub search: search::SearchService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and catalog client
    pub fn new(repository: Repository, auth_config: AuthConfig, catalog: Arc<dyn CatalogClient>) -> Self {
        let books = books::BooksService::new(repository.clone(), catalog);

        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            checkouts: checkouts::CheckoutsService::new(repository.clone()),
            reviews: reviews::ReviewsService::new(repository.clone()),
            data_analysis: data_analysis::DataAnalysisService::new(repository.clone(), books.clone()),
            dashboards: dashboards::DashboardsService::new(repository.clone()),
            search: search::SearchService::new(repository.clone(), books.clone()),
            books,
            repository,
        }
    }

    /// Database pool, for health checks
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.repository.pool
    }
}
