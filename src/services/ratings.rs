//! Rating aggregation

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::AverageRating,
    repository::{books::BooksRepository, reviews::ReviewsRepository},
};

#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    /// The book has no reviews yet
    #[error("no reviews found for book {0}")]
    NotFound(Uuid),

    #[error("rating query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::NotFound(id) => AppError::NotFound(format!("No reviews found for book {}", id)),
            RatingError::Query(e) => AppError::Database(e),
        }
    }
}

/// Histogram, total and mean of a book's reviews
pub async fn average_rating(conn: &mut PgConnection, book_id: Uuid) -> Result<AverageRating, RatingError> {
    let rows = ReviewsRepository::rating_counts(&mut *conn, book_id).await?;
    if rows.is_empty() {
        return Err(RatingError::NotFound(book_id));
    }
    Ok(AverageRating::from_counts(&rows))
}

/// Unreviewed books rate zero; query failures propagate
pub fn or_unrated(result: Result<AverageRating, RatingError>) -> AppResult<AverageRating> {
    match result {
        Ok(rating) => Ok(rating),
        Err(RatingError::NotFound(_)) => Ok(AverageRating::default()),
        Err(err) => Err(err.into()),
    }
}

/// Recompute and store a book's rating and review count
pub async fn refresh_book_rating(conn: &mut PgConnection, book_id: Uuid) -> AppResult<AverageRating> {
    let rating = or_unrated(average_rating(&mut *conn, book_id).await)?;
    BooksRepository::set_rating(&mut *conn, book_id, rating.rating, rating.total_reviews as i64).await?;
    Ok(rating)
}
