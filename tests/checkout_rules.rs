//! Service-level tests against a live database (DATABASE_URL)
//!
//! Run with: cargo test --test checkout_rules -- --ignored

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use ilm_server::{
    config::AppConfig,
    db,
    models::{
        book::{Book, CreateBook},
        checkout::UpdateCheckout,
        enums::{CheckoutState, Role},
        user::RegisterUser,
    },
    repository::{reviews::NewReview, Repository},
    services::{google_books::GoogleBooksClient, Services},
    AppError,
};

async fn services() -> Services {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().unwrap_or_default();

    let pool = PgPoolOptions::new()
        .max_connections(12)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");
    db::migrate(&pool).await.expect("Failed to run migrations");

    // No API key in the default config, so the catalog stays local
    let catalog = GoogleBooksClient::new(&Default::default()).expect("catalog client");
    Services::new(Repository::new(pool), config.auth.clone(), Arc::new(catalog))
}

async fn new_user(services: &Services, paid: bool) -> Uuid {
    let user = services
        .users
        .register(RegisterUser {
            email: format!("rules-{}@example.com", Uuid::new_v4().simple()),
            profile_image_url: String::new(),
            name: "Rules Reader".into(),
            role: Some(Role::Patrons),
            password: "Password1".into(),
        })
        .await
        .expect("register");

    sqlx::query("UPDATE users SET is_payment_done = $2 WHERE id = $1")
        .bind(user.id)
        .bind(paid)
        .execute(services.pool())
        .await
        .expect("set payment flag");

    user.id
}

fn book_request(copies: i64) -> CreateBook {
    let mut book = CreateBook::unshelved(
        Uuid::new_v4().simple().to_string()[..13].to_string(),
        "Rules Book".into(),
    );
    book.author = "Rules Author".into();
    book.cover_image = "http://covers.example.com/rules.png".into();
    book.in_library = Some(true);
    book.books_left = Some(copies);
    book
}

async fn new_book(services: &Services, copies: i64) -> Book {
    services.books.create(&book_request(copies)).await.expect("create book")
}

async fn books_left(services: &Services, book_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT books_left FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(services.pool())
        .await
        .expect("read stock")
}

fn return_patch(id: Uuid) -> UpdateCheckout {
    UpdateCheckout {
        id: Some(id),
        state: Some(CheckoutState::Returned),
        number_of_days: None,
        fine_amount: None,
    }
}

#[tokio::test]
#[ignore]
async fn test_unpaid_user_is_refused_before_stock_is_checked() {
    let services = services().await;
    let user = new_user(&services, false).await;
    let empty = new_book(&services, 0).await;

    let err = services.checkouts.create(user, empty.id, 7).await.unwrap_err();
    assert!(matches!(err, AppError::PaymentPending), "got {:?}", err);
}

#[tokio::test]
#[ignore]
async fn test_empty_book_is_out_of_stock() {
    let services = services().await;
    let user = new_user(&services, true).await;
    let empty = new_book(&services, 0).await;

    let err = services.checkouts.create(user, empty.id, 7).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfStock), "got {:?}", err);
    assert_eq!(books_left(&services, empty.id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_second_open_ticket_conflicts() {
    let services = services().await;
    let user = new_user(&services, true).await;
    let book = new_book(&services, 2).await;

    services.checkouts.create(user, book.id, 7).await.expect("first checkout");
    let err = services.checkouts.create(user, book.id, 7).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    // The refused attempt rolled back its decrement
    assert_eq!(books_left(&services, book.id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_checkout_again_after_return() {
    let services = services().await;
    let user = new_user(&services, true).await;
    let book = new_book(&services, 1).await;

    let first = services.checkouts.create(user, book.id, 7).await.expect("first checkout");
    assert_eq!(books_left(&services, book.id).await, 0);

    let returned = services
        .checkouts
        .update(first.id, &return_patch(first.id))
        .await
        .expect("return");
    assert_eq!(returned.state, CheckoutState::Returned);
    assert!(returned.returned_date.is_some());
    assert_eq!(books_left(&services, book.id).await, 1);

    let second = services.checkouts.create(user, book.id, 7).await.expect("second checkout");
    assert_ne!(first.id, second.id);
    assert_eq!(services.checkouts.get_by_user_book(book.id, user).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_checkouts_share_the_last_copy() {
    let services = Arc::new(services().await);
    let book = new_book(&services, 1).await;

    let mut users = Vec::new();
    for _ in 0..8 {
        users.push(new_user(&services, true).await);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let services = Arc::clone(&services);
            tokio::spawn(async move { services.checkouts.create(user, book.id, 7).await })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => granted += 1,
            Err(AppError::OutOfStock) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(books_left(&services, book.id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_rating_histogram_from_reviews() {
    let services = services().await;
    let book = new_book(&services, 5).await;

    for stars in [5, 5, 4, 3, 3] {
        let user = new_user(&services, true).await;
        let ticket = services.checkouts.create(user, book.id, 7).await.expect("checkout");
        services
            .reviews
            .create(NewReview {
                book_id: book.id,
                checkout_id: ticket.id,
                user_id: user,
                comment_heading: "Heading".into(),
                comment: "Comment".into(),
                rating: stars,
            })
            .await
            .expect("review");
    }

    let rating = services.books.ratings(&book.isbn).await.expect("ratings");
    assert_eq!(rating.total_reviews, 5);
    assert!((rating.rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(rating.histogram.five_star, 2);
    assert_eq!(rating.histogram.four_star, 1);
    assert_eq!(rating.histogram.three_star, 2);
    assert_eq!(rating.histogram.two_star, 0);
    assert_eq!(rating.histogram.one_star, 0);

    let stored: (f64, i64) = sqlx::query_as("SELECT rating, review_count FROM books WHERE id = $1")
        .bind(book.id)
        .fetch_one(services.pool())
        .await
        .expect("stored rating");
    assert!((stored.0 - 4.0).abs() < f64::EPSILON);
    assert_eq!(stored.1, 5);
}

#[tokio::test]
#[ignore]
async fn test_isbn_upsert_overwrites_existing_row() {
    let services = services().await;
    let mut request = book_request(3);
    let first = services.books.create(&request).await.expect("first upsert");

    request.title = "Rules Book, Second Edition".into();
    request.books_left = Some(5);
    let second = services.books.create(&request).await.expect("second upsert");

    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "Rules Book, Second Edition");
    assert_eq!(second.books_left, 5);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = $1")
        .bind(&request.isbn)
        .fetch_one(services.pool())
        .await
        .expect("count");
    assert_eq!(rows, 1);
}
