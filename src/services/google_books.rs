//! Google Books volumes client
//!
//! Fetches volumes from the public catalog and normalizes them into the
//! local book shape. Errors never reach the HTTP layer: callers fall back
//! to the local store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    config::GoogleBooksConfig,
    error::{AppError, AppResult},
    models::{book::CreateBook, pagination::Pagination, search::SearchBy},
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("external catalog is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// One page of normalized volumes
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Matches reported by the catalog, not the length of `books`
    pub total_items: i64,
    pub books: Vec<CreateBook>,
}

/// Source of external book metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Volumes matching `text`, restricted to the field named by `by`
    async fn search_volumes(&self, text: String, by: SearchBy, page: Pagination) -> Result<CatalogPage, CatalogError>;

    /// Most recently published volumes
    async fn newest_volumes(&self, page: Pagination) -> Result<CatalogPage, CatalogError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub total_items: i64,
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_links: ImageLinks,
    #[serde(default)]
    pub preview_link: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: String,
}

/// Parse the date layouts the catalog returns: `YYYY`, `YYYY-MM`,
/// `YYYY-MM-DD` and `DD-MM-YYYY`. Missing parts default to the first.
pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let date = match raw.len() {
        4 => raw.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%d-%m-%Y"))
            .ok(),
    }?;

    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Map one volume onto the local book shape. Volumes with no industry
/// identifier are dropped.
pub fn normalize_volume(volume: Volume) -> Option<CreateBook> {
    let info = volume.volume_info;
    let isbn = info
        .industry_identifiers
        .into_iter()
        .map(|id| id.identifier)
        .find(|id| !id.trim().is_empty())?;

    let published_date = parse_published_date(&info.published_date);
    if published_date.is_none() && !info.published_date.is_empty() {
        tracing::debug!("Unparsed published date {:?} for {}", info.published_date, isbn);
    }

    let description = if info.description.is_empty() {
        info.subtitle
    } else {
        info.description
    };

    Some(CreateBook {
        author: info.authors.into_iter().next().unwrap_or_else(|| "unknown".to_string()),
        genre: info.categories.into_iter().next().unwrap_or_else(|| "other".to_string()),
        published_date,
        description,
        preview_link: info.preview_link,
        cover_image: info.image_links.thumbnail,
        ..CreateBook::unshelved(isbn, info.title)
    })
}

/// Query string for a field-restricted search
pub fn volume_query(text: &str, by: SearchBy) -> String {
    let text = text.trim();
    match by {
        SearchBy::Title => format!("intitle:{text}"),
        SearchBy::Author => format!("inauthor:{text}"),
        SearchBy::Isbn => format!("isbn:{text}"),
        SearchBy::Genre => format!("subject:{text}"),
        _ => text.to_string(),
    }
}

/// reqwest-backed client for the Google Books volumes API
#[derive(Clone)]
pub struct GoogleBooksClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleBooksClient {
    pub fn new(config: &GoogleBooksConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build catalog client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch(&self, q: &str, order_by: &str, page: Pagination) -> Result<CatalogPage, CatalogError> {
        if self.api_key.is_empty() {
            return Err(CatalogError::NotConfigured);
        }

        let start_index = page.offset().to_string();
        let max_results = page.limit.to_string();

        let response = self
            .http
            .get(format!("{}/v1/volumes", self.base_url))
            .query(&[
                ("q", q),
                ("orderBy", order_by),
                ("startIndex", start_index.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let volumes: VolumesResponse = response.json().await?;
        tracing::debug!("Catalog returned {} of {} volumes", volumes.items.len(), volumes.total_items);

        Ok(CatalogPage {
            total_items: volumes.total_items,
            books: volumes.items.into_iter().filter_map(normalize_volume).collect(),
        })
    }
}

#[async_trait]
impl CatalogClient for GoogleBooksClient {
    async fn search_volumes(&self, text: String, by: SearchBy, page: Pagination) -> Result<CatalogPage, CatalogError> {
        self.fetch(&volume_query(&text, by), "relevance", page).await
    }

    async fn newest_volumes(&self, page: Pagination) -> Result<CatalogPage, CatalogError> {
        self.fetch("*", "newest", page).await
    }
}
