//! Reviews repository for database operations

use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        review::{Review, ReviewSort},
    },
};

/// Validated review fields written on create
#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: Uuid,
    pub checkout_id: Uuid,
    pub user_id: Uuid,
    pub comment_heading: String,
    pub comment: String,
    pub rating: i32,
}

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a review, or overwrite the one already posted for the same
    /// book, checkout and user
    pub async fn upsert_with<'e, E: PgExecutor<'e>>(executor: E, review: &NewReview) -> AppResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, book_id, checkout_id, user_id, comment_heading, comment, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (book_id, checkout_id, user_id) DO UPDATE SET
                comment_heading = EXCLUDED.comment_heading,
                comment = EXCLUDED.comment,
                rating = EXCLUDED.rating,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.book_id)
        .bind(review.checkout_id)
        .bind(review.user_id)
        .bind(&review.comment_heading)
        .bind(&review.comment)
        .bind(review.rating)
        .fetch_one(executor)
        .await?;

        Ok(review)
    }

    /// Get review by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// One page of a book's reviews plus the book's review total
    pub async fn list_by_book(
        &self,
        book_id: Uuid,
        sort: ReviewSort,
        page: Pagination,
    ) -> AppResult<(Vec<Review>, i64)> {
        let sql = format!(
            "SELECT * FROM reviews WHERE book_id = $1 ORDER BY {}, id LIMIT $2 OFFSET $3",
            sort.order_clause()
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(book_id)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((reviews, total))
    }

    /// Update heading, comment, rating and likes of a review
    pub async fn update_with<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        comment_heading: &str,
        comment: &str,
        rating: i32,
        likes: i64,
    ) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET
                comment_heading = $2,
                comment = $3,
                rating = $4,
                likes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(comment_heading)
        .bind(comment)
        .bind(rating)
        .bind(likes)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// Delete a review, returning the deleted row
    pub async fn delete_with<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<Review> {
        sqlx::query_as::<_, Review>("DELETE FROM reviews WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// Review counts grouped by star value
    pub async fn rating_counts<'e, E: PgExecutor<'e>>(executor: E, book_id: Uuid) -> Result<Vec<(i32, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (i32, i64)>(
            "SELECT rating, COUNT(*) FROM reviews WHERE book_id = $1 GROUP BY rating ORDER BY rating",
        )
        .bind(book_id)
        .fetch_all(executor)
        .await
    }
}
