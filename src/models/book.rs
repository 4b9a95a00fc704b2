//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Point weights used by the demand score
pub const RATING_WEIGHT: i64 = 5;
pub const REVIEW_WEIGHT: i64 = 1;
pub const VIEW_WEIGHT: i64 = 1;
pub const WISHLIST_WEIGHT: i64 = 1;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "desc")]
    pub description: String,
    pub preview_link: String,
    pub cover_image: String,
    pub shelf_number: i64,
    pub in_library: bool,
    pub books_left: i64,
    pub views: i64,
    pub wishlist_count: i64,
    pub review_count: i64,
    pub rating: f64,
    pub approximate_demand: i64,
    pub reviews_list: Vec<String>,
    pub views_list: Vec<String>,
    pub wish_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Weighted sum of the engagement signals. Rating is truncated to whole points.
    pub fn demand_score(&self) -> i64 {
        let rating_points = (self.rating * RATING_WEIGHT as f64) as i64;
        let review_points = self.reviews_list.len() as i64 * REVIEW_WEIGHT;
        let view_points = self.views * VIEW_WEIGHT;
        let wishlist_points = self.wishlist_count * WISHLIST_WEIGHT;

        rating_points + review_points + view_points + wishlist_points
    }

    /// Demand score normalised by the dominant weight
    pub fn approximate_demand(&self) -> i64 {
        self.demand_score() / RATING_WEIGHT
    }
}

/// Width of the `books.isbn` column
pub const ISBN_MAX_LEN: usize = 32;

/// Create (or overwrite by ISBN) a book
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[serde(rename = "ISBN", default)]
    #[validate(length(min = 1, max = 32))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub preview_link: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub cover_image: String,
    #[validate(range(min = 0))]
    pub shelf_number: Option<i64>,
    pub in_library: Option<bool>,
    #[validate(range(min = 0))]
    pub books_left: Option<i64>,
    #[validate(range(min = 0))]
    pub views: Option<i64>,
    #[validate(range(min = 0))]
    pub wishlist_count: Option<i64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(range(min = 0))]
    pub review_count: Option<i64>,
    pub approximate_demand: Option<i64>,
    #[serde(default)]
    pub wish_list: Vec<String>,
    #[serde(default)]
    pub reviews_list: Vec<String>,
    #[serde(default)]
    pub views_list: Vec<String>,
}

impl CreateBook {
    /// Book shape used for volumes pulled from the external catalog:
    /// engagement counters zeroed, not shelved, no stock.
    pub fn unshelved(isbn: String, title: String) -> Self {
        Self {
            isbn,
            title,
            author: String::new(),
            genre: String::new(),
            published_date: None,
            description: String::new(),
            preview_link: String::new(),
            cover_image: String::new(),
            shelf_number: Some(0),
            in_library: Some(false),
            books_left: Some(0),
            views: Some(0),
            wishlist_count: Some(0),
            rating: Some(0.0),
            review_count: Some(0),
            approximate_demand: Some(0),
            wish_list: Vec::new(),
            reviews_list: Vec::new(),
            views_list: Vec::new(),
        }
    }
}

/// Update a book identified by its ISBN
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[serde(rename = "ISBN", default)]
    #[validate(length(min = 1, max = 32))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub preview_link: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub cover_image: String,
    #[validate(required, range(min = 0))]
    pub shelf_number: Option<i64>,
    pub in_library: Option<bool>,
    #[validate(required, range(min = 0))]
    pub books_left: Option<i64>,
    #[validate(required, range(min = 0))]
    pub views: Option<i64>,
    #[validate(required, range(min = 0))]
    pub wishlist_count: Option<i64>,
    #[validate(required, range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(required, range(min = 0))]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub wish_list: Vec<String>,
    #[serde(default)]
    pub reviews_list: Vec<String>,
    #[serde(default)]
    pub views_list: Vec<String>,
}

/// Which of a user's book lists to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookDetailsFrom {
    Reserved,
    Pending,
    CheckedOut,
    Completed,
    Wishlists,
}

impl BookDetailsFrom {
    /// Unknown list names read the wishlist
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "reserved" => BookDetailsFrom::Reserved,
            "pending" => BookDetailsFrom::Pending,
            "checkedout" => BookDetailsFrom::CheckedOut,
            "completed" => BookDetailsFrom::Completed,
            _ => BookDetailsFrom::Wishlists,
        }
    }
}

/// Per-star review counts of a book
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistogram {
    pub one_star: u32,
    pub two_star: u32,
    pub three_star: u32,
    pub four_star: u32,
    pub five_star: u32,
}

/// Aggregated rating of a book
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageRating {
    pub rating: f64,
    pub total_reviews: u32,
    #[serde(flatten)]
    pub histogram: RatingHistogram,
}

impl AverageRating {
    /// Buckets `(star, count)` rows. Stars outside 1..=5 count toward the
    /// total but land in no bucket.
    pub fn from_counts(rows: &[(i32, i64)]) -> Self {
        let mut histogram = RatingHistogram::default();
        let mut total_reviews = 0u32;

        for &(star, count) in rows {
            let count = count.max(0) as u32;
            total_reviews += count;
            match star {
                1 => histogram.one_star += count,
                2 => histogram.two_star += count,
                3 => histogram.three_star += count,
                4 => histogram.four_star += count,
                5 => histogram.five_star += count,
                other => tracing::debug!("rating value {} is not bucketed", other),
            }
        }

        let weighted = histogram.one_star
            + histogram.two_star * 2
            + histogram.three_star * 3
            + histogram.four_star * 4
            + histogram.five_star * 5;

        let rating = if total_reviews == 0 {
            0.0
        } else {
            weighted as f64 / total_reviews as f64
        };

        Self {
            rating,
            total_reviews,
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(rating: f64, reviews: usize, views: i64, wishlist_count: i64) -> Book {
        Book {
            id: Uuid::new_v4(),
            isbn: "9780000000000".into(),
            title: "Title".into(),
            author: "Author".into(),
            genre: "fiction".into(),
            published_date: None,
            description: String::new(),
            preview_link: String::new(),
            cover_image: String::new(),
            shelf_number: 1,
            in_library: true,
            books_left: 1,
            views,
            wishlist_count,
            review_count: reviews as i64,
            rating,
            approximate_demand: 0,
            reviews_list: (0..reviews).map(|i| i.to_string()).collect(),
            views_list: Vec::new(),
            wish_list: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_demand_score_weights() {
        let b = book(4.0, 2, 10, 3);
        assert_eq!(b.demand_score(), 20 + 2 + 10 + 3);
        assert_eq!(b.approximate_demand(), 35 / 5);
    }

    #[test]
    fn test_demand_score_truncates_rating_points() {
        // 3.3 * 5 = 16.5
        assert_eq!(book(3.3, 0, 0, 0).demand_score(), 16);
    }

    #[test]
    fn test_demand_score_monotonic() {
        let base = book(2.0, 1, 1, 1).demand_score();
        assert!(book(3.0, 1, 1, 1).demand_score() >= base);
        assert!(book(2.0, 2, 1, 1).demand_score() >= base);
        assert!(book(2.0, 1, 2, 1).demand_score() >= base);
        assert!(book(2.0, 1, 1, 2).demand_score() >= base);
    }

    #[test]
    fn test_average_rating_histogram() {
        // reviews {5, 5, 4, 3, 3}
        let rating = AverageRating::from_counts(&[(5, 2), (4, 1), (3, 2)]);
        assert_eq!(rating.total_reviews, 5);
        assert_eq!(rating.histogram.five_star, 2);
        assert_eq!(rating.histogram.four_star, 1);
        assert_eq!(rating.histogram.three_star, 2);
        assert_eq!(rating.histogram.one_star, 0);
        assert!((rating.rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_rating_empty() {
        let rating = AverageRating::from_counts(&[]);
        assert_eq!(rating.total_reviews, 0);
        assert_eq!(rating.rating, 0.0);
    }

    #[test]
    fn test_zero_star_counts_toward_total() {
        let rating = AverageRating::from_counts(&[(0, 1), (4, 1)]);
        assert_eq!(rating.total_reviews, 2);
        assert!((rating.rating - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_book_details_from() {
        assert_eq!(BookDetailsFrom::parse("checkedout"), BookDetailsFrom::CheckedOut);
        assert_eq!(BookDetailsFrom::parse("Reserved"), BookDetailsFrom::Reserved);
        assert_eq!(BookDetailsFrom::parse("anything"), BookDetailsFrom::Wishlists);
    }
}
