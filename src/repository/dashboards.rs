//! Dashboard aggregation queries

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::dashboard::{DataBoard, LineGraphPoint},
};

/// Number of calendar months on the line graph, current month included
pub const LINE_GRAPH_MONTHS: i32 = 7;

#[derive(Clone)]
pub struct DashboardsRepository {
    pool: Pool<Postgres>,
}

impl DashboardsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Users registered in each month and the checkouts they opened that month.
    /// Every month of the window is present, oldest first.
    pub async fn line_graph(&self) -> AppResult<Vec<LineGraphPoint>> {
        let points = sqlx::query_as::<_, LineGraphPoint>(
            r#"
            SELECT m.month AS month,
                   COUNT(DISTINCT u.id) AS no_of_active_users,
                   COUNT(DISTINCT ct.id) AS no_of_checkouts
            FROM generate_series(
                date_trunc('month', NOW()) - make_interval(months => $1 - 1),
                date_trunc('month', NOW()),
                INTERVAL '1 month'
            ) AS m(month)
            LEFT JOIN users u
                ON date_trunc('month', u.created_at) = m.month
            LEFT JOIN checkout_tickets ct
                ON ct.user_id = u.id
               AND date_trunc('month', ct.reserved_on) = m.month
            GROUP BY m.month
            ORDER BY m.month
            "#,
        )
        .bind(LINE_GRAPH_MONTHS)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }

    /// Library totals and the current month's activity
    pub async fn data_board(&self) -> AppResult<DataBoard> {
        let board = sqlx::query_as::<_, DataBoard>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users_count,
                (SELECT COUNT(*) FROM books) AS books_count,
                (SELECT COUNT(*) FROM checkout_tickets) AS checkouts_count,
                (SELECT COALESCE(SUM(fine_amount), 0)::DOUBLE PRECISION FROM checkout_tickets) AS revenue_amount_total,
                (SELECT COUNT(*) FROM books
                    WHERE created_at >= date_trunc('month', NOW())) AS monthly_new_books_added_count,
                (SELECT COUNT(*) FROM users
                    WHERE created_at >= date_trunc('month', NOW())) AS monthly_new_registered_user_count,
                (SELECT COUNT(*) FROM checkout_tickets
                    WHERE created_at >= date_trunc('month', NOW())) AS monthly_new_checkout_tickets_count,
                (SELECT COALESCE(SUM(fine_amount), 0)::DOUBLE PRECISION FROM checkout_tickets
                    WHERE created_at >= date_trunc('month', NOW())) AS monthly_fine_amount_total
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(board)
    }
}
