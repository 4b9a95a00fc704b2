//! Pagination and sorting query parameters

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// `page`/`limit` with optional sort field and direction
#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SortPagination {
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 5))]
    pub limit: u32,
    pub sort_by: Option<String>,
    /// `ascending` or `descending`
    pub order_by: Option<String>,
}

/// `page`/`limit` only
#[derive(Debug, Clone, Copy, Deserialize, Validate, IntoParams, ToSchema)]
pub struct Pagination {
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 5))]
    pub limit: u32,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.limit as i64
    }
}

impl SortPagination {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn order(&self) -> SortOrder {
        SortOrder::parse(self.order_by.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `descending` sorts ascending
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("descending") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// `ceil(total_rows / limit)`
pub fn total_pages(total_rows: i64, limit: u32) -> u32 {
    if limit == 0 || total_rows <= 0 {
        return 0;
    }
    let limit = limit as i64;
    ((total_rows + limit - 1) / limit) as u32
}

/// A page of books
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub total_pages: u32,
    pub books: Vec<super::book::Book>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(23, 5), 5);
        assert_eq!(total_pages(20, 5), 4);
        assert_eq!(total_pages(1, 5), 1);
        assert_eq!(total_pages(0, 5), 0);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination { page: 1, limit: 5 }.offset(), 0);
        assert_eq!(Pagination { page: 3, limit: 10 }.offset(), 20);
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::parse(Some("descending")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("ascending")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("DESC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(None).as_sql(), "ASC");
    }
}
