//! Users repository for database operations

use std::collections::HashMap;

use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookDetailsFrom,
        enums::Role,
        pagination::SortPagination,
        search::SearchBy,
        user::{BookDetails, BookDetailsRow, UpdateBookDetails, UpdateUser, User, UserWithBookDetails},
    },
};

/// Sortable user columns. Unknown keys sort by name.
pub fn user_sort_column(raw: Option<&str>) -> &'static str {
    match raw {
        Some("reserved") => "bd.reserved_books_count",
        Some("checkedOut") => "bd.checked_out_books_count",
        Some("wishLists") => "COALESCE(cardinality(bd.wishlist_books), 0)",
        Some("completed") => "bd.completed_books_count",
        _ => "u.name",
    }
}

fn search_clause(by: SearchBy) -> &'static str {
    match by {
        SearchBy::Email => "LOWER(u.email) LIKE LOWER($1)",
        SearchBy::Username => "LOWER(u.name) LIKE LOWER($1)",
        _ => "(LOWER(u.email) LIKE LOWER($1) OR LOWER(u.name) LIKE LOWER($1))",
    }
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a user, or refresh name, image and role when the email is
    /// already known. The book ledger is created in the same transaction.
    pub async fn upsert(
        &self,
        email: &str,
        name: &str,
        profile_image_url: &str,
        role: Role,
        password_hash: &str,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, profile_image_url, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                profile_image_url = EXCLUDED.profile_image_url,
                role = EXCLUDED.role,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(profile_image_url)
        .bind(role)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO book_details (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))
    }

    pub async fn get_book_details(&self, user_id: Uuid) -> AppResult<Option<BookDetails>> {
        let row = sqlx::query_as::<_, BookDetailsRow>("SELECT * FROM book_details WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BookDetails::from))
    }

    /// User together with the book ledger
    pub async fn get_with_book_details(&self, id: Uuid) -> AppResult<UserWithBookDetails> {
        let user = self.get_by_id(id).await?;
        let book_details = self.get_book_details(id).await?;
        Ok(UserWithBookDetails { user, book_details })
    }

    /// ISBNs held in one of the user's book lists
    pub async fn book_list(&self, user_id: Uuid, from: BookDetailsFrom) -> AppResult<Vec<String>> {
        let details = self
            .get_book_details(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book details for user {} not found", user_id)))?;

        Ok(match from {
            BookDetailsFrom::Reserved => details.reserved_book_list,
            BookDetailsFrom::Pending => details.pending_books_list,
            BookDetailsFrom::CheckedOut => details.checked_out_book_list,
            BookDetailsFrom::Completed => details.completed_books_list,
            BookDetailsFrom::Wishlists => details.wishlist_books,
        })
    }

    /// Sorted page of users plus the total row count
    pub async fn list(&self, query: &SortPagination) -> AppResult<(Vec<UserWithBookDetails>, i64)> {
        let page = query.pagination();
        let sql = format!(
            "SELECT u.* FROM users u LEFT JOIN book_details bd ON bd.user_id = u.id \
             ORDER BY {} {}, u.id LIMIT $1 OFFSET $2",
            user_sort_column(query.sort_by.as_deref()),
            query.order().as_sql()
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((self.attach_book_details(users).await?, total))
    }

    /// Case-insensitive substring search over email and/or name
    pub async fn search(
        &self,
        text: &str,
        by: SearchBy,
        query: &SortPagination,
    ) -> AppResult<(Vec<UserWithBookDetails>, i64)> {
        let page = query.pagination();
        let pattern = format!("%{}%", text.trim());
        let clause = search_clause(by);

        let sql = format!(
            "SELECT u.* FROM users u LEFT JOIN book_details bd ON bd.user_id = u.id \
             WHERE {} ORDER BY {} {}, u.id LIMIT $2 OFFSET $3",
            clause,
            user_sort_column(query.sort_by.as_deref()),
            query.order().as_sql()
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users u WHERE {}", clause))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok((self.attach_book_details(users).await?, total))
    }

    async fn attach_book_details(&self, users: Vec<User>) -> AppResult<Vec<UserWithBookDetails>> {
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let rows = sqlx::query_as::<_, BookDetailsRow>("SELECT * FROM book_details WHERE user_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_user: HashMap<Uuid, BookDetails> = rows
            .into_iter()
            .map(|row| (row.user_id, BookDetails::from(row)))
            .collect();

        Ok(users
            .into_iter()
            .map(|user| {
                let book_details = by_user.remove(&user.id);
                UserWithBookDetails { user, book_details }
            })
            .collect())
    }

    /// Update a user's profile
    pub async fn update(&self, id: Uuid, user: &UpdateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = $2,
                profile_image_url = $3,
                name = $4,
                role = $5,
                date_of_birth = $6,
                phone_number = $7,
                address = $8,
                country = $9,
                joined_date = COALESCE($10, joined_date),
                views = COALESCE($11, views),
                fine_amount = $12,
                is_payment_done = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.profile_image_url)
        .bind(&user.name)
        .bind(user.role.unwrap_or(Role::Patrons))
        .bind(user.date_of_birth)
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.country)
        .bind(user.joined_date)
        .bind(user.views)
        .bind(user.fine_amount)
        .bind(user.is_payment_done)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Replace the book ledger. Counts follow the list lengths.
    pub async fn update_book_details(
        &self,
        user_id: Uuid,
        details: &UpdateBookDetails,
        favorite_genres: &[String],
    ) -> AppResult<BookDetails> {
        let row = sqlx::query_as::<_, BookDetailsRow>(
            r#"
            UPDATE book_details SET
                pending_books_list = $2,
                pending_books_count = cardinality($2::text[]),
                checked_out_book_list = $3,
                checked_out_books_count = cardinality($3::text[]),
                reserved_book_list = $4,
                reserved_books_count = cardinality($4::text[]),
                completed_books_list = $5,
                completed_books_count = cardinality($5::text[]),
                favorite_genres = $6,
                wishlist_books = $7,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&details.pending_books_list)
        .bind(&details.checked_out_book_list)
        .bind(&details.reserved_book_list)
        .bind(&details.completed_books_list)
        .bind(favorite_genres)
        .bind(&details.wishlist_books)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book details for user {} not found", user_id)))?;

        Ok(BookDetails::from(row))
    }

    /// Append an ISBN to the user's wishlist
    pub async fn add_wishlist_book<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid, isbn: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE book_details SET
                wishlist_books = array_append(wishlist_books, $2),
                updated_at = NOW()
            WHERE user_id = $1 AND NOT ($2 = ANY(wishlist_books))
            "#,
        )
        .bind(user_id)
        .bind(isbn)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Delete a user. Tickets and reviews are kept.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Ok(())
    }
}
