//! Checkout ticket model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{book::Book, enums::CheckoutState, user::UserShort};

/// Checkout ticket from database
#[derive(Debug, Clone, FromRow)]
pub struct CheckoutTicket {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub state: CheckoutState,
    pub number_of_days: i64,
    pub fine_amount: f64,
    pub reserved_on: Option<DateTime<Utc>>,
    pub checked_out_on: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Checkout ticket as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTicketResponse {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "bookID")]
    pub book_id: Uuid,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub state: CheckoutState,
    pub is_checked_out: bool,
    pub is_returned: bool,
    pub number_of_days: i64,
    pub fine_amount: f64,
    pub reserved_on: Option<DateTime<Utc>>,
    pub checked_out_on: Option<DateTime<Utc>>,
    pub returned_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CheckoutTicket> for CheckoutTicketResponse {
    fn from(ticket: CheckoutTicket) -> Self {
        Self {
            id: ticket.id,
            book_id: ticket.book_id,
            user_id: ticket.user_id,
            state: ticket.state,
            // isCheckedOut stays set once the book has left the shelf
            is_checked_out: ticket.checked_out_on.is_some()
                || ticket.state == CheckoutState::CheckedOut,
            is_returned: ticket.state == CheckoutState::Returned,
            number_of_days: ticket.number_of_days,
            fine_amount: ticket.fine_amount,
            reserved_on: ticket.reserved_on,
            checked_out_on: ticket.checked_out_on,
            returned_date: ticket.returned_date,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

/// Checkout ticket joined with its book and borrower
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTicketDetails {
    #[serde(flatten)]
    pub ticket: CheckoutTicketResponse,
    pub book: Book,
    pub user: UserShort,
}

/// A page of tickets with their book and borrower
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPage {
    pub total_pages: u32,
    pub checkouts: Vec<CheckoutTicketDetails>,
}

/// Create checkout ticket request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckout {
    #[serde(rename = "bookID")]
    #[validate(required)]
    pub book_id: Option<Uuid>,
    /// Defaults to the authenticated user
    #[serde(rename = "userID")]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub number_of_days: i64,
}

/// Update checkout ticket request. A `state` change goes through the
/// transition guard.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckout {
    #[serde(rename = "ID")]
    #[validate(required)]
    pub id: Option<Uuid>,
    pub state: Option<CheckoutState>,
    #[validate(range(min = 1))]
    pub number_of_days: Option<i64>,
    #[validate(range(min = 0.0))]
    pub fine_amount: Option<f64>,
}

/// Sort columns for checkout listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutSort {
    ReservedOn,
    CheckedOutOn,
    ReturnedDate,
    FineAmount,
}

impl CheckoutSort {
    /// Unknown keys sort by reservation date
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("checkedOutOn") | Some("checkedoutOn") => CheckoutSort::CheckedOutOn,
            Some("returnedDate") | Some("returnedOn") => CheckoutSort::ReturnedDate,
            Some("fineAmount") => CheckoutSort::FineAmount,
            _ => CheckoutSort::ReservedOn,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CheckoutSort::ReservedOn => "ct.reserved_on",
            CheckoutSort::CheckedOutOn => "ct.checked_out_on",
            CheckoutSort::ReturnedDate => "ct.returned_date",
            CheckoutSort::FineAmount => "ct.fine_amount",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(state: CheckoutState, checked_out_on: Option<DateTime<Utc>>) -> CheckoutTicket {
        CheckoutTicket {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            state,
            number_of_days: 14,
            fine_amount: 0.0,
            reserved_on: Some(Utc::now()),
            checked_out_on,
            returned_date: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_flags_follow_state() {
        let reserved = CheckoutTicketResponse::from(ticket(CheckoutState::Reserved, None));
        assert!(!reserved.is_checked_out && !reserved.is_returned);

        let out = CheckoutTicketResponse::from(ticket(CheckoutState::CheckedOut, Some(Utc::now())));
        assert!(out.is_checked_out && !out.is_returned);

        let returned = CheckoutTicketResponse::from(ticket(CheckoutState::Returned, Some(Utc::now())));
        assert!(returned.is_checked_out && returned.is_returned);
    }

    #[test]
    fn test_sort_fallback() {
        assert_eq!(CheckoutSort::parse(None), CheckoutSort::ReservedOn);
        assert_eq!(CheckoutSort::parse(Some("bogus")), CheckoutSort::ReservedOn);
        assert_eq!(CheckoutSort::parse(Some("checkedoutOn")), CheckoutSort::CheckedOutOn);
        assert_eq!(CheckoutSort::parse(Some("returnedOn")), CheckoutSort::ReturnedDate);
        assert_eq!(CheckoutSort::parse(Some("fineAmount")).column(), "ct.fine_amount");
    }

    #[test]
    fn test_loan_length_must_be_positive() {
        let request = |days: i64| CreateCheckout {
            book_id: Some(Uuid::new_v4()),
            user_id: None,
            number_of_days: days,
        };

        assert!(request(0).validate().is_err());
        assert!(request(-3).validate().is_err());
        assert!(request(1).validate().is_ok());

        let missing: CreateCheckout = serde_json::from_value(serde_json::json!({
            "bookID": Uuid::new_v4()
        }))
        .unwrap();
        assert!(missing.validate().is_err());
    }
}
