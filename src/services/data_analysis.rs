//! Demand ranking, recommendations and similar books

use rand::seq::SliceRandom;

use crate::{
    error::AppResult,
    models::{
        book::Book,
        pagination::{total_pages, BookPage, Pagination, SortPagination},
        search::{BookSearch, SearchBy},
        user::BookDetails,
    },
    repository::Repository,
    services::books::BooksService,
};

/// Books sampled from a reader's lists to seed recommendations
pub const RECOMMENDATION_SEEDS: usize = 3;
/// Size of a similar-books answer
pub const SIMILAR_BOOKS: u32 = 3;

/// Up to `count` distinct ISBNs drawn at random from the wishlist,
/// completed, checked-out and reserved lists
pub fn sample_isbns(details: &BookDetails, count: usize) -> Vec<String> {
    let mut isbns: Vec<String> = Vec::new();
    for isbn in details
        .wishlist_books
        .iter()
        .chain(&details.completed_books_list)
        .chain(&details.checked_out_book_list)
        .chain(&details.reserved_book_list)
    {
        if !isbns.contains(isbn) {
            isbns.push(isbn.clone());
        }
    }

    isbns.shuffle(&mut rand::thread_rng());
    isbns.truncate(count);
    isbns
}

/// `genre author ` for each seed book
pub fn seed_text(books: &[Book]) -> String {
    books
        .iter()
        .map(|b| format!("{} {} ", b.genre, b.author))
        .collect()
}

#[derive(Clone)]
pub struct DataAnalysisService {
    repository: Repository,
    books: BooksService,
}

impl DataAnalysisService {
    pub fn new(repository: Repository, books: BooksService) -> Self {
        Self { repository, books }
    }

    /// In-library books with every engagement signal, highest demand first
    pub async fn books_by_demand(&self, page: Pagination) -> AppResult<BookPage> {
        let (ranked, total) = self.repository.books.list_by_demand(page).await?;

        let mut books = Vec::with_capacity(ranked.len());
        for book in ranked {
            books.push(self.books.hydrate(book).await?);
        }

        Ok(BookPage {
            total_pages: total_pages(total, page.limit),
            books,
        })
    }

    /// Books like the ones the reader already holds or wants
    pub async fn recommended_books(&self, user_id: uuid::Uuid, query: &SortPagination) -> AppResult<BookPage> {
        let seeds = match self.repository.users.get_book_details(user_id).await? {
            Some(details) => sample_isbns(&details, RECOMMENDATION_SEEDS),
            None => Vec::new(),
        };

        let seed_books = self.repository.books.list_by_isbns(&seeds).await?;
        let text = seed_text(&seed_books);
        if text.trim().is_empty() {
            tracing::debug!("No seed books for user {}, listing local books", user_id);
            return self.books.list(query).await;
        }

        self.books
            .search(&BookSearch {
                text,
                by: SearchBy::Any,
                sort: query.clone(),
            })
            .await
    }

    /// Three books close to the given one
    pub async fn similar_books(&self, isbn: &str) -> AppResult<Vec<Book>> {
        let book = self.repository.books.get_by_isbn(isbn).await?;
        let search = BookSearch {
            text: format!("{} {} {}", book.genre, book.author, book.description),
            by: SearchBy::Any,
            sort: SortPagination {
                page: 1,
                limit: SIMILAR_BOOKS + 1,
                sort_by: None,
                order_by: None,
            },
        };

        let mut similar: Vec<Book> = self
            .books
            .search(&search)
            .await?
            .books
            .into_iter()
            .filter(|b| b.isbn != book.isbn)
            .collect();

        if similar.len() < SIMILAR_BOOKS as usize {
            similar = self
                .books
                .any_books(SIMILAR_BOOKS + 1)
                .await?
                .into_iter()
                .filter(|b| b.isbn != book.isbn)
                .collect();
        }

        similar.truncate(SIMILAR_BOOKS as usize);
        Ok(similar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn details() -> BookDetails {
        BookDetails {
            user_id: Uuid::new_v4(),
            pending_books_count: 0,
            pending_books_list: vec!["pending-only".into()],
            checked_out_books_count: 1,
            checked_out_book_list: vec!["333".into()],
            reserved_books_count: 1,
            reserved_book_list: vec!["111".into()],
            completed_books_count: 1,
            completed_books_list: vec!["222".into()],
            favorite_genres: vec![],
            wishlist_books: vec!["111".into(), "444".into()],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_sample_isbns_is_bounded_and_distinct() {
        let sampled = sample_isbns(&details(), 3);
        assert_eq!(sampled.len(), 3);

        let mut unique = sampled.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
        assert!(!sampled.contains(&"pending-only".to_string()));
    }

    #[test]
    fn test_sample_isbns_short_lists() {
        let mut small = details();
        small.wishlist_books.clear();
        small.checked_out_book_list.clear();
        small.reserved_book_list.clear();

        assert_eq!(sample_isbns(&small, 3), vec!["222".to_string()]);
    }

    #[test]
    fn test_seed_text() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "ID": Uuid::new_v4(),
            "ISBN": "111",
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "science_fiction",
            "publishedDate": null,
            "desc": "",
            "previewLink": "",
            "coverImage": "",
            "shelfNumber": 1,
            "inLibrary": true,
            "booksLeft": 2,
            "views": 0,
            "wishlistCount": 0,
            "reviewCount": 0,
            "rating": 0.0,
            "approximateDemand": 0,
            "reviewsList": [],
            "viewsList": [],
            "wishList": [],
            "createdAt": Utc::now(),
            "updatedAt": null
        }))
        .unwrap();

        assert_eq!(seed_text(&[book]), "science_fiction Frank Herbert ");
        assert_eq!(seed_text(&[]), "");
    }
}
