//! Dashboard aggregates

use crate::{
    error::AppResult,
    models::{
        book::Book,
        dashboard::{DataBoard, LineGraphPoint},
    },
    repository::Repository,
};

/// Books shown on the high-demand panel
pub const HIGH_DEMAND_BOOKS: i64 = 3;

#[derive(Clone)]
pub struct DashboardsService {
    repository: Repository,
}

impl DashboardsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn line_graph(&self) -> AppResult<Vec<LineGraphPoint>> {
        self.repository.dashboards.line_graph().await
    }

    pub async fn data_board(&self) -> AppResult<DataBoard> {
        self.repository.dashboards.data_board().await
    }

    /// Most wishlisted books
    pub async fn high_demand(&self) -> AppResult<Vec<Book>> {
        self.repository.books.most_wished(HIGH_DEMAND_BOOKS).await
    }
}
