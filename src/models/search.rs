//! Search request

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::SortPagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Book,
    User,
}

/// Which columns a search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBy {
    Title,
    Author,
    Isbn,
    Genre,
    Email,
    Username,
    /// Every searchable column of the entity
    Any,
}

impl SearchBy {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("title") => SearchBy::Title,
            Some("author") => SearchBy::Author,
            Some("isbn") => SearchBy::Isbn,
            Some("genre") | Some("subject") => SearchBy::Genre,
            Some("email") => SearchBy::Email,
            Some("username") => SearchBy::Username,
            _ => SearchBy::Any,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 5))]
    pub limit: u32,
    pub sort_by: Option<String>,
    pub order_by: Option<String>,
    #[serde(default)]
    pub search_text: String,
    pub search_by: Option<String>,
    /// `book` or `user`
    #[serde(rename = "type")]
    pub search_type: Option<String>,
}

impl SearchQuery {
    pub fn sort(&self) -> SortPagination {
        SortPagination {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            order_by: self.order_by.clone(),
        }
    }

    pub fn search_by(&self) -> SearchBy {
        SearchBy::parse(self.search_by.as_deref())
    }

    pub fn kind(&self) -> Option<SearchType> {
        match self.search_type.as_deref() {
            Some("book") => Some(SearchType::Book),
            Some("user") => Some(SearchType::User),
            _ => None,
        }
    }
}

/// Book search handed to the catalog and the local store
#[derive(Debug, Clone)]
pub struct BookSearch {
    pub text: String,
    pub by: SearchBy,
    pub sort: SortPagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_by() {
        assert_eq!(SearchBy::parse(Some("subject")), SearchBy::Genre);
        assert_eq!(SearchBy::parse(Some("genre")), SearchBy::Genre);
        assert_eq!(SearchBy::parse(Some("recommendation")), SearchBy::Any);
        assert_eq!(SearchBy::parse(None), SearchBy::Any);
    }
}
