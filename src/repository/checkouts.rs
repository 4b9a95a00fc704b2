//! Checkout tickets repository for database operations

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        checkout::{CheckoutSort, CheckoutTicket, CheckoutTicketDetails, CheckoutTicketResponse},
        enums::CheckoutState,
        pagination::SortPagination,
        user::{User, UserShort},
    },
};

/// Name of the partial unique index guarding open tickets
pub const OPEN_TICKET_INDEX: &str = "idx_checkout_tickets_open";

/// Field values written by a ticket update
#[derive(Debug, Clone)]
pub struct TicketChanges {
    pub state: CheckoutState,
    pub number_of_days: i64,
    pub fine_amount: f64,
    pub checked_out_on: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CheckoutsRepository {
    pool: Pool<Postgres>,
}

impl CheckoutsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a reserved ticket. A second open ticket for the same
    /// book and user violates `idx_checkout_tickets_open`.
    pub async fn insert_with<'e, E: PgExecutor<'e>>(
        executor: E,
        book_id: Uuid,
        user_id: Uuid,
        number_of_days: i64,
    ) -> AppResult<CheckoutTicket> {
        let ticket = sqlx::query_as::<_, CheckoutTicket>(
            r#"
            INSERT INTO checkout_tickets (id, book_id, user_id, state, number_of_days, reserved_on)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(user_id)
        .bind(CheckoutState::Reserved)
        .bind(number_of_days)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some(OPEN_TICKET_INDEX) => {
                AppError::Conflict("user already holds an open checkout for this book".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(ticket)
    }

    /// Get ticket by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<CheckoutTicket> {
        Self::get_by_id_with(&self.pool, id).await
    }

    /// Get ticket by ID, locking the row for the rest of the transaction
    pub async fn get_by_id_with<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<CheckoutTicket> {
        sqlx::query_as::<_, CheckoutTicket>("SELECT * FROM checkout_tickets WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Checkout ticket with id {} not found", id)))
    }

    /// All of a user's tickets for one book, oldest first
    pub async fn list_for_user_book<'e, E: PgExecutor<'e>>(
        executor: E,
        book_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<CheckoutTicket>> {
        let tickets = sqlx::query_as::<_, CheckoutTicket>(
            "SELECT * FROM checkout_tickets WHERE book_id = $1 AND user_id = $2 ORDER BY reserved_on",
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(tickets)
    }

    /// Tickets of the given user for one book
    pub async fn get_by_user_book(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Vec<CheckoutTicket>> {
        Self::list_for_user_book(&self.pool, book_id, user_id).await
    }

    /// All of a user's tickets, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CheckoutTicket>> {
        let tickets = sqlx::query_as::<_, CheckoutTicket>(
            "SELECT * FROM checkout_tickets WHERE user_id = $1 ORDER BY reserved_on DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Paginated tickets with their book and borrower
    pub async fn list_with_details(&self, query: &SortPagination) -> AppResult<(Vec<CheckoutTicketDetails>, i64)> {
        let page = query.pagination();
        let sql = format!(
            "SELECT ct.* FROM checkout_tickets ct \
             JOIN books b ON b.id = ct.book_id \
             JOIN users u ON u.id = ct.user_id \
             ORDER BY {} {} NULLS LAST, ct.id LIMIT $1 OFFSET $2",
            CheckoutSort::parse(query.sort_by.as_deref()).column(),
            query.order().as_sql()
        );

        let tickets = sqlx::query_as::<_, CheckoutTicket>(&sql)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkout_tickets ct \
             JOIN books b ON b.id = ct.book_id \
             JOIN users u ON u.id = ct.user_id",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((self.attach_details(tickets).await?, total))
    }

    async fn attach_details(&self, tickets: Vec<CheckoutTicket>) -> AppResult<Vec<CheckoutTicketDetails>> {
        let book_ids: Vec<Uuid> = tickets.iter().map(|t| t.book_id).collect();
        let user_ids: Vec<Uuid> = tickets.iter().map(|t| t.user_id).collect();

        let books: HashMap<Uuid, Book> = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ANY($1)")
            .bind(&book_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        let users: HashMap<Uuid, UserShort> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, UserShort::from(u)))
            .collect();

        // Tickets come from an inner join, both sides are present
        Ok(tickets
            .into_iter()
            .filter_map(|ticket| {
                let book = books.get(&ticket.book_id)?.clone();
                let user = users.get(&ticket.user_id)?.clone();
                Some(CheckoutTicketDetails {
                    ticket: CheckoutTicketResponse::from(ticket),
                    book,
                    user,
                })
            })
            .collect())
    }

    /// Write the checked changes of a ticket
    pub async fn update_with<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        changes: &TicketChanges,
    ) -> AppResult<CheckoutTicket> {
        sqlx::query_as::<_, CheckoutTicket>(
            r#"
            UPDATE checkout_tickets SET
                state = $2,
                number_of_days = $3,
                fine_amount = $4,
                checked_out_on = $5,
                returned_date = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.state)
        .bind(changes.number_of_days)
        .bind(changes.fine_amount)
        .bind(changes.checked_out_on)
        .bind(changes.returned_date)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Checkout ticket with id {} not found", id)))
    }

    /// Delete a ticket, returning the deleted row
    pub async fn delete_with<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<CheckoutTicket> {
        sqlx::query_as::<_, CheckoutTicket>("DELETE FROM checkout_tickets WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Checkout ticket with id {} not found", id)))
    }
}
