//! Book catalog service
//!
//! Local inventory plus the external catalog. External lookups are
//! best-effort: any failure logs and falls back to the local store.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{AverageRating, Book, CreateBook, UpdateBook},
        pagination::{total_pages, BookPage, Pagination, SortPagination},
        search::{BookSearch, SearchBy},
    },
    repository::{books::BooksRepository, users::UsersRepository, Repository},
    services::{
        google_books::{CatalogClient, CatalogError, CatalogPage},
        ratings,
    },
};

/// Ask the catalog for volumes. `None` means the caller should use local data.
pub async fn external_volumes(
    catalog: &dyn CatalogClient,
    text: &str,
    by: SearchBy,
    page: Pagination,
) -> Option<CatalogPage> {
    filter_catalog_result(catalog.search_volumes(text.to_string(), by, page).await)
}

fn filter_catalog_result(result: Result<CatalogPage, CatalogError>) -> Option<CatalogPage> {
    match result {
        Ok(page) if page.books.is_empty() => {
            tracing::debug!("External catalog returned no usable volumes");
            None
        }
        Ok(page) => Some(page),
        Err(CatalogError::NotConfigured) => {
            tracing::debug!("External catalog disabled, using local books");
            None
        }
        Err(e) => {
            tracing::warn!("External catalog failed, using local books: {}", e);
            None
        }
    }
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    catalog: Arc<dyn CatalogClient>,
}

impl BooksService {
    pub fn new(repository: Repository, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { repository, catalog }
    }

    /// Create or overwrite a book by ISBN
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let book = self.repository.books.upsert(book).await?;
        tracing::info!("Upserted book {} ({})", book.isbn, book.id);
        Ok(book)
    }

    /// Upsert a batch of books, all or nothing
    pub async fn create_many(&self, books: &[CreateBook]) -> AppResult<Vec<Book>> {
        let books = self.repository.books.upsert_many(books).await?;
        tracing::info!("Upserted {} books", books.len());
        Ok(books)
    }

    /// Get a book, counting the viewer once
    pub async fn get_by_isbn(&self, isbn: &str, viewer: Uuid) -> AppResult<Book> {
        self.repository.books.record_view(isbn, viewer).await?;
        let book = self.repository.books.get_by_isbn(isbn).await?;
        self.hydrate(book).await
    }

    /// Refresh the rating from the reviews and recompute the displayed demand
    pub async fn hydrate(&self, mut book: Book) -> AppResult<Book> {
        let rating = self.rating_of(book.id).await?;
        book.rating = rating.rating;
        book.approximate_demand = book.approximate_demand();
        Ok(book)
    }

    pub async fn rating_of(&self, book_id: Uuid) -> AppResult<AverageRating> {
        let mut conn = self.repository.pool.acquire().await?;
        ratings::or_unrated(ratings::average_rating(&mut conn, book_id).await)
    }

    /// Rating histogram of a book
    pub async fn ratings(&self, isbn: &str) -> AppResult<AverageRating> {
        let book = self.repository.books.get_by_isbn(isbn).await?;
        self.rating_of(book.id).await
    }

    /// Sorted page of local books
    pub async fn list(&self, query: &SortPagination) -> AppResult<BookPage> {
        let (books, total) = self.repository.books.list(query).await?;
        Ok(BookPage {
            total_pages: total_pages(total, query.limit),
            books,
        })
    }

    pub async fn update(&self, book: &UpdateBook) -> AppResult<Book> {
        self.repository.books.update(book).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    /// Add a book to the user's wishlist. Repeat calls change nothing.
    pub async fn add_to_wishlist(&self, user_id: Uuid, isbn: &str) -> AppResult<Book> {
        let book = self.repository.books.get_by_isbn(isbn).await?;

        let mut tx = self.repository.pool.begin().await?;
        let added = BooksRepository::add_wisher(&mut *tx, &book.isbn, user_id).await?;
        UsersRepository::add_wishlist_book(&mut *tx, user_id, &book.isbn).await?;
        tx.commit().await?;

        if added {
            tracing::debug!("User {} wishlisted {}", user_id, book.isbn);
        }

        self.repository.books.get_by_isbn(isbn).await
    }

    /// Search the external catalog first, then the local store
    pub async fn search(&self, search: &BookSearch) -> AppResult<BookPage> {
        let page = search.sort.pagination();

        if let Some(found) = external_volumes(self.catalog.as_ref(), &search.text, search.by, page).await {
            let books = self.persist_external(&found.books, &search.sort).await?;
            return Ok(BookPage {
                total_pages: total_pages(found.total_items, page.limit),
                books,
            });
        }

        self.search_local(search).await
    }

    /// Case-insensitive substring search over local books
    pub async fn search_local(&self, search: &BookSearch) -> AppResult<BookPage> {
        let (books, total) = self.repository.books.search(search).await?;
        Ok(BookPage {
            total_pages: total_pages(total, search.sort.limit),
            books,
        })
    }

    /// Newest external volumes, or the local listing when the catalog is unavailable
    pub async fn new_books(&self, query: &SortPagination) -> AppResult<BookPage> {
        let page = query.pagination();

        if let Some(found) = filter_catalog_result(self.catalog.newest_volumes(page).await) {
            let books = self.persist_external(&found.books, query).await?;
            return Ok(BookPage {
                total_pages: total_pages(found.total_items, page.limit),
                books,
            });
        }

        self.list(query).await
    }

    /// Store external volumes, then read them back as persisted
    async fn persist_external(&self, books: &[CreateBook], sort: &SortPagination) -> AppResult<Vec<Book>> {
        self.repository.books.upsert_external(books).await?;
        let isbns: Vec<String> = books.iter().map(|b| b.isbn.clone()).collect();
        self.repository
            .books
            .list_by_isbns_sorted(&isbns, sort.sort_by.as_deref(), sort.order())
            .await
    }

    /// Any `count` local books, for callers that must return something
    pub async fn any_books(&self, count: u32) -> AppResult<Vec<Book>> {
        let query = SortPagination {
            page: 1,
            limit: count,
            sort_by: None,
            order_by: None,
        };
        let (books, _) = self.repository.books.list(&query).await?;
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google_books::MockCatalogClient;

    fn page_of(isbns: &[&str]) -> CatalogPage {
        CatalogPage {
            total_items: isbns.len() as i64,
            books: isbns
                .iter()
                .map(|isbn| CreateBook::unshelved(isbn.to_string(), format!("Title {}", isbn)))
                .collect(),
        }
    }

    fn first_page() -> Pagination {
        Pagination { page: 1, limit: 5 }
    }

    #[tokio::test]
    async fn test_external_volumes_used_when_available() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_search_volumes()
            .withf(|text, by, _| text == "dune" && *by == SearchBy::Title)
            .times(1)
            .returning(|_, _, _| Ok(page_of(&["111", "222"])));

        let found = external_volumes(&catalog, "dune", SearchBy::Title, first_page())
            .await
            .unwrap();
        assert_eq!(found.books.len(), 2);
        assert_eq!(found.books[0].isbn, "111");
    }

    #[tokio::test]
    async fn test_catalog_failure_falls_back() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_search_volumes().returning(|_, _, _| {
            Err(CatalogError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        });

        assert!(external_volumes(&catalog, "dune", SearchBy::Any, first_page()).await.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_catalog_falls_back() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_search_volumes()
            .returning(|_, _, _| Err(CatalogError::NotConfigured));

        assert!(external_volumes(&catalog, "dune", SearchBy::Any, first_page()).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_catalog_result_falls_back() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_search_volumes()
            .returning(|_, _, _| Ok(CatalogPage::default()));

        assert!(external_volumes(&catalog, "dune", SearchBy::Any, first_page()).await.is_none());
    }
}
