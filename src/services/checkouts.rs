//! Checkout lifecycle
//!
//! Tickets move `reserved -> checked_out -> returned`. Every change that
//! moves stock runs in the same transaction as the ticket write.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        checkout::{CheckoutPage, CheckoutTicket, CheckoutTicketResponse, UpdateCheckout},
        enums::CheckoutState,
        pagination::{total_pages, SortPagination},
    },
    repository::{
        books::BooksRepository,
        checkouts::{CheckoutsRepository, TicketChanges},
        Repository,
    },
};

/// Checked field values for an update. Entering `checked_out` or
/// `returned` stamps the matching timestamp once.
pub fn plan_update(ticket: &CheckoutTicket, patch: &UpdateCheckout) -> AppResult<TicketChanges> {
    let state = match patch.state {
        Some(next) => ticket.state.transition(next)?,
        None => ticket.state,
    };

    let now = Utc::now();
    let checked_out_on = match state {
        CheckoutState::CheckedOut if ticket.checked_out_on.is_none() => Some(now),
        _ => ticket.checked_out_on,
    };
    let returned_date = match state {
        CheckoutState::Returned if ticket.returned_date.is_none() => Some(now),
        _ => ticket.returned_date,
    };

    Ok(TicketChanges {
        state,
        number_of_days: patch.number_of_days.unwrap_or(ticket.number_of_days),
        fine_amount: patch.fine_amount.unwrap_or(ticket.fine_amount),
        checked_out_on,
        returned_date,
    })
}

#[derive(Clone)]
pub struct CheckoutsService {
    repository: Repository,
}

impl CheckoutsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Reserve a copy of a book for a user
    pub async fn create(&self, user_id: Uuid, book_id: Uuid, number_of_days: i64) -> AppResult<CheckoutTicketResponse> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.is_payment_done {
            tracing::info!("Checkout refused for user {}: payment pending", user_id);
            return Err(AppError::PaymentPending);
        }

        let mut tx = self.repository.pool.begin().await?;

        let book = BooksRepository::get_by_id_with(&mut *tx, book_id).await?;
        if book.books_left == 0 {
            tracing::info!("Checkout refused for book {}: out of stock", book_id);
            return Err(AppError::OutOfStock);
        }

        let tickets = CheckoutsRepository::list_for_user_book(&mut *tx, book_id, user_id).await?;
        if tickets.iter().any(|t| t.state.is_open()) {
            return Err(AppError::Conflict(
                "user already holds an open checkout for this book".to_string(),
            ));
        }

        if !BooksRepository::take_copy(&mut *tx, book_id).await? {
            tracing::info!("Checkout refused for book {}: last copy taken concurrently", book_id);
            return Err(AppError::OutOfStock);
        }

        let ticket = CheckoutsRepository::insert_with(&mut *tx, book_id, user_id, number_of_days).await?;
        tx.commit().await?;

        tracing::info!("Reserved book {} for user {} (ticket {})", book_id, user_id, ticket.id);
        Ok(ticket.into())
    }

    /// Update a ticket. State changes go through the transition guard and
    /// a return puts the copy back.
    pub async fn update(&self, id: Uuid, patch: &UpdateCheckout) -> AppResult<CheckoutTicketResponse> {
        let mut tx = self.repository.pool.begin().await?;

        let ticket = CheckoutsRepository::get_by_id_with(&mut *tx, id).await?;
        let changes = plan_update(&ticket, patch)?;

        let updated = CheckoutsRepository::update_with(&mut *tx, id, &changes).await?;
        if ticket.state.is_open() && !updated.state.is_open() {
            BooksRepository::return_copy(&mut *tx, updated.book_id).await?;
        }

        tx.commit().await?;

        if ticket.state != updated.state {
            tracing::info!("Checkout ticket {} moved from {} to {}", id, ticket.state, updated.state);
        }
        Ok(updated.into())
    }

    /// Delete a ticket. An open ticket gives its copy back.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let ticket = CheckoutsRepository::delete_with(&mut *tx, id).await?;
        if ticket.state.is_open() {
            BooksRepository::return_copy(&mut *tx, ticket.book_id).await?;
        }

        tx.commit().await?;
        tracing::info!("Deleted checkout ticket {}", id);
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<CheckoutTicketResponse> {
        Ok(self.repository.checkouts.get_by_id(id).await?.into())
    }

    /// A user's tickets for one book
    pub async fn get_by_user_book(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Vec<CheckoutTicketResponse>> {
        let tickets = self.repository.checkouts.get_by_user_book(book_id, user_id).await?;
        Ok(tickets.into_iter().map(Into::into).collect())
    }

    /// All of a user's tickets
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<CheckoutTicketResponse>> {
        let tickets = self.repository.checkouts.list_for_user(user_id).await?;
        Ok(tickets.into_iter().map(Into::into).collect())
    }

    /// Paginated tickets with details
    pub async fn list_with_details(&self, query: &SortPagination) -> AppResult<CheckoutPage> {
        let (checkouts, total) = self.repository.checkouts.list_with_details(query).await?;
        Ok(CheckoutPage {
            total_pages: total_pages(total, query.limit),
            checkouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(state: CheckoutState) -> CheckoutTicket {
        let now = Utc::now();
        CheckoutTicket {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            state,
            number_of_days: 14,
            fine_amount: 0.0,
            reserved_on: Some(now),
            checked_out_on: (state != CheckoutState::Reserved).then_some(now),
            returned_date: (state == CheckoutState::Returned).then_some(now),
            created_at: now,
            updated_at: None,
        }
    }

    fn patch(state: Option<CheckoutState>) -> UpdateCheckout {
        UpdateCheckout {
            id: Some(Uuid::new_v4()),
            state,
            number_of_days: None,
            fine_amount: None,
        }
    }

    #[test]
    fn test_check_out_stamps_checked_out_on() {
        let current = ticket(CheckoutState::Reserved);
        let changes = plan_update(&current, &patch(Some(CheckoutState::CheckedOut))).unwrap();

        assert_eq!(changes.state, CheckoutState::CheckedOut);
        assert!(changes.checked_out_on.is_some());
        assert!(changes.returned_date.is_none());
    }

    #[test]
    fn test_return_stamps_returned_date_and_keeps_checkout_time() {
        let current = ticket(CheckoutState::CheckedOut);
        let changes = plan_update(&current, &patch(Some(CheckoutState::Returned))).unwrap();

        assert_eq!(changes.state, CheckoutState::Returned);
        assert_eq!(changes.checked_out_on, current.checked_out_on);
        assert!(changes.returned_date.is_some());
    }

    #[test]
    fn test_unclaimed_reservation_can_be_closed() {
        let current = ticket(CheckoutState::Reserved);
        let changes = plan_update(&current, &patch(Some(CheckoutState::Returned))).unwrap();

        assert!(changes.checked_out_on.is_none());
        assert!(changes.returned_date.is_some());
    }

    #[test]
    fn test_returned_ticket_cannot_reopen() {
        let current = ticket(CheckoutState::Returned);
        for next in [CheckoutState::CheckedOut, CheckoutState::Reserved] {
            assert!(matches!(
                plan_update(&current, &patch(Some(next))),
                Err(AppError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn test_field_edit_keeps_state() {
        let current = ticket(CheckoutState::CheckedOut);
        let edit = UpdateCheckout {
            number_of_days: Some(21),
            fine_amount: Some(2.5),
            ..patch(None)
        };
        let changes = plan_update(&current, &edit).unwrap();

        assert_eq!(changes.state, CheckoutState::CheckedOut);
        assert_eq!(changes.number_of_days, 21);
        assert_eq!(changes.fine_amount, 2.5);
        assert_eq!(changes.checked_out_on, current.checked_out_on);
    }
}
