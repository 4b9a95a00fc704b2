//! Reviews service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        pagination::{total_pages, SortPagination},
        review::{Review, ReviewPage, ReviewSort, UpdateReview},
    },
    repository::{
        books::BooksRepository,
        reviews::{NewReview, ReviewsRepository},
        Repository,
    },
    services::ratings,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Post (or overwrite) a review and refresh the book's rating
    pub async fn create(&self, review: NewReview) -> AppResult<Review> {
        // Resolve first so a missing book is a 404, not a foreign key error
        self.repository.books.get_by_id(review.book_id).await?;
        self.repository.checkouts.get_by_id(review.checkout_id).await?;

        let mut tx = self.repository.pool.begin().await?;
        let saved = ReviewsRepository::upsert_with(&mut *tx, &review).await?;
        BooksRepository::add_review_id(&mut *tx, saved.book_id, saved.id).await?;
        let rating = ratings::refresh_book_rating(&mut tx, saved.book_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Review {} saved for book {}, rating now {:.2} over {} reviews",
            saved.id,
            saved.book_id,
            rating.rating,
            rating.total_reviews
        );
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Review> {
        self.repository.reviews.get_by_id(id).await
    }

    /// One page of a book's reviews
    pub async fn list_by_book(&self, book_id: Uuid, query: &SortPagination) -> AppResult<ReviewPage> {
        let sort = ReviewSort::parse(query.sort_by.as_deref());
        let (reviews, total) = self
            .repository
            .reviews
            .list_by_book(book_id, sort, query.pagination())
            .await?;

        Ok(ReviewPage {
            total_pages: total_pages(total, query.limit),
            reviews,
        })
    }

    /// Edit a review and refresh the book's rating
    pub async fn update(&self, id: Uuid, request: &UpdateReview) -> AppResult<Review> {
        let mut tx = self.repository.pool.begin().await?;
        let saved = ReviewsRepository::update_with(
            &mut *tx,
            id,
            &request.comment_heading,
            &request.comment,
            request.rating.unwrap_or_default(),
            request.likes,
        )
        .await?;
        ratings::refresh_book_rating(&mut tx, saved.book_id).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// Delete a review and refresh the book's rating
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        let removed = ReviewsRepository::delete_with(&mut *tx, id).await?;
        BooksRepository::remove_review_id(&mut *tx, removed.book_id, removed.id).await?;
        ratings::refresh_book_rating(&mut tx, removed.book_id).await?;
        tx.commit().await?;

        tracing::info!("Deleted review {} of book {}", id, removed.book_id);
        Ok(())
    }
}
