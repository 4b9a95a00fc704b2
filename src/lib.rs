//! ILM library management server
//!
//! REST JSON API for a library catalog: users and their book ledgers, books
//! backed by the Google Books catalog, checkout tickets, reviews, demand
//! ranking and librarian dashboards.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub validator: Arc<validation::RequestValidator>,
}
