//! Repository layer for database operations

pub mod books;
pub mod checkouts;
pub mod dashboards;
pub mod reviews;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub checkouts: checkouts::CheckoutsRepository,
    pub reviews: reviews::ReviewsRepository,
    pub dashboards: dashboards::DashboardsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            checkouts: checkouts::CheckoutsRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            dashboards: dashboards::DashboardsRepository::new(pool.clone()),
            pool,
        }
    }
}
