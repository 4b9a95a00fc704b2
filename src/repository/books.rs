//! Books repository for database operations

use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook, ISBN_MAX_LEN, RATING_WEIGHT, REVIEW_WEIGHT, VIEW_WEIGHT, WISHLIST_WEIGHT},
        pagination::{Pagination, SortOrder, SortPagination},
        search::{BookSearch, SearchBy},
    },
};

/// Sortable book columns. Unknown keys sort by title.
pub fn book_sort_column(raw: Option<&str>) -> &'static str {
    match raw {
        Some("author") => "author",
        Some("isbn") => "isbn",
        Some("booksLeft") => "books_left",
        Some("genre") => "genre",
        Some("publishedDate") => "published_date",
        Some("shelfNumber") => "shelf_number",
        Some("rating") => "rating",
        Some("approximateDemand") => "approximate_demand",
        Some("wishlistCount") => "wishlist_count",
        Some("views") => "views",
        Some("reviewCount") => "review_count",
        _ => "title",
    }
}

fn isbn_listing_sql(sort_by: Option<&str>, order: SortOrder) -> String {
    format!(
        "SELECT * FROM books WHERE isbn = ANY($1) ORDER BY {} {}, id",
        book_sort_column(sort_by),
        order.as_sql()
    )
}

/// External volumes whose identifier fits the ISBN column
pub fn storable_external(books: &[CreateBook]) -> Vec<&CreateBook> {
    books
        .iter()
        .filter(|book| {
            let fits = book.isbn.chars().count() <= ISBN_MAX_LEN;
            if !fits {
                tracing::warn!("Skipping external volume with oversized identifier {}", book.isbn);
            }
            fits
        })
        .collect()
}

fn search_clause(by: SearchBy) -> &'static str {
    match by {
        SearchBy::Title => "LOWER(title) LIKE LOWER($1)",
        SearchBy::Author => "LOWER(author) LIKE LOWER($1)",
        SearchBy::Isbn => "LOWER(isbn) LIKE LOWER($1)",
        SearchBy::Genre => "LOWER(genre) LIKE LOWER($1)",
        _ => {
            "(LOWER(title) LIKE LOWER($1) OR LOWER(author) LIKE LOWER($1) \
             OR LOWER(genre) LIKE LOWER($1) OR LOWER(isbn) LIKE LOWER($1))"
        }
    }
}

const DEMAND_FILTER: &str = "in_library = TRUE AND rating != 0 AND views != 0 \
     AND wishlist_count != 0 AND review_count != 0";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a book or overwrite the row holding the same ISBN
    pub async fn upsert(&self, book: &CreateBook) -> AppResult<Book> {
        Self::upsert_with(&self.pool, book).await
    }

    /// Upsert every book inside one transaction
    pub async fn upsert_many(&self, books: &[CreateBook]) -> AppResult<Vec<Book>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(books.len());
        for book in books {
            stored.push(Self::upsert_with(&mut *tx, book).await?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn upsert_with<'e, E: PgExecutor<'e>>(executor: E, book: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, isbn, title, author, genre, published_date, description,
                preview_link, cover_image, shelf_number, in_library, books_left,
                views, wishlist_count, review_count, rating, approximate_demand,
                reviews_list, views_list, wish_list
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            ON CONFLICT (isbn) DO UPDATE SET
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                genre = EXCLUDED.genre,
                published_date = EXCLUDED.published_date,
                description = EXCLUDED.description,
                preview_link = EXCLUDED.preview_link,
                cover_image = EXCLUDED.cover_image,
                shelf_number = EXCLUDED.shelf_number,
                in_library = EXCLUDED.in_library,
                books_left = EXCLUDED.books_left,
                views = EXCLUDED.views,
                wishlist_count = EXCLUDED.wishlist_count,
                review_count = EXCLUDED.review_count,
                rating = EXCLUDED.rating,
                approximate_demand = EXCLUDED.approximate_demand,
                reviews_list = EXCLUDED.reviews_list,
                views_list = EXCLUDED.views_list,
                wish_list = EXCLUDED.wish_list,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(if book.genre.is_empty() { "other" } else { book.genre.as_str() })
        .bind(book.published_date)
        .bind(&book.description)
        .bind(&book.preview_link)
        .bind(&book.cover_image)
        .bind(book.shelf_number.unwrap_or(0))
        .bind(book.in_library.unwrap_or(false))
        .bind(book.books_left.unwrap_or(0))
        .bind(book.views.unwrap_or(0))
        .bind(book.wishlist_count.unwrap_or(0))
        .bind(book.review_count.unwrap_or(0))
        .bind(book.rating.unwrap_or(0.0))
        .bind(book.approximate_demand.unwrap_or(0))
        .bind(&book.reviews_list)
        .bind(&book.views_list)
        .bind(&book.wish_list)
        .fetch_one(executor)
        .await?;

        Ok(book)
    }

    /// External catalog volumes only refresh metadata of books already on
    /// the shelf: stock and engagement counters are left untouched.
    pub async fn upsert_external(&self, books: &[CreateBook]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for book in storable_external(books) {
            sqlx::query(
                r#"
                INSERT INTO books (
                    id, isbn, title, author, genre, published_date, description,
                    preview_link, cover_image
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (isbn) DO UPDATE SET
                    title = EXCLUDED.title,
                    author = EXCLUDED.author,
                    genre = EXCLUDED.genre,
                    published_date = COALESCE(EXCLUDED.published_date, books.published_date),
                    description = EXCLUDED.description,
                    preview_link = EXCLUDED.preview_link,
                    cover_image = EXCLUDED.cover_image,
                    updated_at = NOW()
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&book.isbn)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .bind(book.published_date)
            .bind(&book.description)
            .bind(&book.preview_link)
            .bind(&book.cover_image)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        Self::get_by_id_with(&self.pool, id).await
    }

    pub async fn get_by_id_with<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Books whose ISBN is in `isbns`, ordered by title
    pub async fn list_by_isbns(&self, isbns: &[String]) -> AppResult<Vec<Book>> {
        self.list_by_isbns_sorted(isbns, None, SortOrder::Asc).await
    }

    /// Books with the given ISBNs in the caller's sort order
    pub async fn list_by_isbns_sorted(
        &self,
        isbns: &[String],
        sort_by: Option<&str>,
        order: SortOrder,
    ) -> AppResult<Vec<Book>> {
        if isbns.is_empty() {
            return Ok(Vec::new());
        }

        let books = sqlx::query_as::<_, Book>(&isbn_listing_sql(sort_by, order))
            .bind(isbns)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Sorted page of books plus the total row count
    pub async fn list(&self, query: &SortPagination) -> AppResult<(Vec<Book>, i64)> {
        let page = query.pagination();
        let sql = format!(
            "SELECT * FROM books ORDER BY {} {}, id LIMIT $1 OFFSET $2",
            book_sort_column(query.sort_by.as_deref()),
            query.order().as_sql()
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Case-insensitive substring search
    pub async fn search(&self, search: &BookSearch) -> AppResult<(Vec<Book>, i64)> {
        let page = search.sort.pagination();
        let pattern = format!("%{}%", search.text.trim());
        let clause = search_clause(search.by);

        let sql = format!(
            "SELECT * FROM books WHERE {} ORDER BY {} {}, id LIMIT $2 OFFSET $3",
            clause,
            book_sort_column(search.sort.sort_by.as_deref()),
            search.sort.order().as_sql()
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(&pattern)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", clause))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Overwrite a book identified by ISBN
    pub async fn update(&self, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $2,
                author = $3,
                genre = $4,
                published_date = $5,
                description = $6,
                preview_link = $7,
                cover_image = $8,
                shelf_number = $9,
                in_library = $10,
                books_left = $11,
                views = $12,
                wishlist_count = $13,
                review_count = $14,
                rating = $15,
                reviews_list = $16,
                views_list = $17,
                wish_list = $18,
                updated_at = NOW()
            WHERE isbn = $1
            RETURNING *
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(if book.genre.is_empty() { "other" } else { book.genre.as_str() })
        .bind(book.published_date)
        .bind(&book.description)
        .bind(&book.preview_link)
        .bind(&book.cover_image)
        .bind(book.shelf_number.unwrap_or(0))
        .bind(book.in_library.unwrap_or(false))
        .bind(book.books_left.unwrap_or(0))
        .bind(book.views.unwrap_or(0))
        .bind(book.wishlist_count.unwrap_or(0))
        .bind(book.review_count.unwrap_or(0))
        .bind(book.rating.unwrap_or(0.0))
        .bind(&book.reviews_list)
        .bind(&book.views_list)
        .bind(&book.wish_list)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", book.isbn)))
    }

    /// Delete a book
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Count one view per viewer
    pub async fn record_view(&self, isbn: &str, viewer: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                views = views + 1,
                views_list = array_append(views_list, $2)
            WHERE isbn = $1 AND NOT ($2 = ANY(views_list))
            "#,
        )
        .bind(isbn)
        .bind(viewer.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add `user` to the wishers of a book. Returns false when already there.
    pub async fn add_wisher<'e, E: PgExecutor<'e>>(executor: E, isbn: &str, user: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                wishlist_count = wishlist_count + 1,
                wish_list = array_append(wish_list, $2),
                updated_at = NOW()
            WHERE isbn = $1 AND NOT ($2 = ANY(wish_list))
            "#,
        )
        .bind(isbn)
        .bind(user.to_string())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Take one copy off the shelf. False when none is left.
    pub async fn take_copy<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET books_left = books_left - 1, updated_at = NOW() \
             WHERE id = $1 AND books_left > 0",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Put one copy back on the shelf
    pub async fn return_copy<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE books SET books_left = books_left + 1, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Store the aggregated rating and review count of a book
    pub async fn set_rating<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        rating: f64,
        review_count: i64,
    ) -> AppResult<()> {
        sqlx::query("UPDATE books SET rating = $2, review_count = $3, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(rating)
            .bind(review_count)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn add_review_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, review_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE books SET reviews_list = array_append(reviews_list, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(reviews_list))",
        )
        .bind(id)
        .bind(review_id.to_string())
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn remove_review_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, review_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE books SET reviews_list = array_remove(reviews_list, $2) WHERE id = $1")
            .bind(id)
            .bind(review_id.to_string())
            .execute(executor)
            .await?;

        Ok(())
    }

    /// In-library books with every engagement signal set, ranked by the
    /// raw weighted sum
    pub async fn list_by_demand(&self, page: Pagination) -> AppResult<(Vec<Book>, i64)> {
        let sql = format!(
            "SELECT * FROM books WHERE {} \
             ORDER BY (rating * $1) + (views * $2) + (wishlist_count * $3) + (review_count * $4) DESC, id \
             LIMIT $5 OFFSET $6",
            DEMAND_FILTER
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(RATING_WEIGHT as f64)
            .bind(VIEW_WEIGHT)
            .bind(WISHLIST_WEIGHT)
            .bind(REVIEW_WEIGHT)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", DEMAND_FILTER))
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Most wishlisted books
    pub async fn most_wished(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY wishlist_count DESC, title LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }
}
