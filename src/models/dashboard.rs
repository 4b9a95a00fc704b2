//! Dashboard aggregates

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// New users and their checkouts in one calendar month
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineGraphPoint {
    pub month: DateTime<Utc>,
    pub no_of_active_users: i64,
    pub no_of_checkouts: i64,
}

/// Whole-library totals plus the current month
#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataBoard {
    pub users_count: i64,
    pub books_count: i64,
    pub checkouts_count: i64,
    #[serde(rename = "revenueAmount")]
    pub revenue_amount_total: f64,
    pub monthly_new_books_added_count: i64,
    pub monthly_new_registered_user_count: i64,
    pub monthly_new_checkout_tickets_count: i64,
    pub monthly_fine_amount_total: f64,
}
