//! Data models for the library service

pub mod book;
pub mod checkout;
pub mod dashboard;
pub mod enums;
pub mod pagination;
pub mod review;
pub mod search;
pub mod user;

pub use book::Book;
pub use checkout::CheckoutTicket;
pub use review::Review;
pub use user::User;
