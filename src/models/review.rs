//! Review model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "bookID")]
    pub book_id: Uuid,
    #[serde(rename = "checkoutID")]
    pub checkout_id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub comment_heading: String,
    pub comment: String,
    pub rating: i32,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create (or overwrite) the review of a checkout
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    #[serde(rename = "bookID")]
    #[validate(required)]
    pub book_id: Option<Uuid>,
    #[serde(rename = "checkoutID")]
    #[validate(required)]
    pub checkout_id: Option<Uuid>,
    /// Defaults to the authenticated user
    #[serde(rename = "userID")]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub comment_heading: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub comment: String,
    #[validate(required, range(min = 0, max = 5))]
    pub rating: Option<i32>,
}

/// Update an existing review
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReview {
    #[serde(rename = "ID")]
    #[validate(required)]
    pub id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub comment_heading: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub comment: String,
    #[validate(required, range(min = 0, max = 5))]
    pub rating: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub likes: i64,
}

/// Sort keys for a book's reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSort {
    Likes,
    Newest,
    Oldest,
}

impl ReviewSort {
    /// Unknown keys show the newest reviews first
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("likes") => ReviewSort::Likes,
            Some("oldest") => ReviewSort::Oldest,
            _ => ReviewSort::Newest,
        }
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            ReviewSort::Likes => "likes DESC, created_at DESC",
            ReviewSort::Newest => "created_at DESC",
            ReviewSort::Oldest => "created_at ASC",
        }
    }
}

/// A page of reviews
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub total_pages: u32,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_sort() {
        assert_eq!(ReviewSort::parse(Some("likes")), ReviewSort::Likes);
        assert_eq!(ReviewSort::parse(Some("oldest")).order_clause(), "created_at ASC");
        assert_eq!(ReviewSort::parse(Some("random")), ReviewSort::Newest);
        assert_eq!(ReviewSort::parse(None), ReviewSort::Newest);
    }
}
