//! Book and user search

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        pagination::{total_pages, BookPage},
        search::{BookSearch, SearchQuery, SearchType},
        user::UserPage,
    },
    repository::Repository,
    services::books::BooksService,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SearchResults {
    Books(BookPage),
    Users(UserPage),
}

#[derive(Clone)]
pub struct SearchService {
    repository: Repository,
    books: BooksService,
}

impl SearchService {
    pub fn new(repository: Repository, books: BooksService) -> Self {
        Self { repository, books }
    }

    /// Run a validated search of the given kind
    pub async fn search(&self, kind: SearchType, query: &SearchQuery) -> AppResult<SearchResults> {
        let sort = query.sort();

        match kind {
            SearchType::Book => {
                let page = self
                    .books
                    .search(&BookSearch {
                        text: query.search_text.clone(),
                        by: query.search_by(),
                        sort,
                    })
                    .await?;
                Ok(SearchResults::Books(page))
            }
            SearchType::User => {
                let (users, total) = self
                    .repository
                    .users
                    .search(&query.search_text, query.search_by(), &sort)
                    .await?;
                Ok(SearchResults::Users(UserPage {
                    total_pages: total_pages(total, sort.limit),
                    users,
                }))
            }
        }
    }
}
