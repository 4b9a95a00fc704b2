//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/ilm-service/v1";
const PASSWORD: &str = "Password1";

/// Register a fresh account and return its email
async fn register(client: &Client, role: &str) -> String {
    let email = format!("reader-{}@example.com", Uuid::new_v4().simple());
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": email,
            "name": "Test Reader",
            "role": role,
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    email
}

/// Log in as `email` and return the bearer token
async fn login(client: &Client, email: &str) -> String {
    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to get a bearer token for a new account
async fn get_auth_token(client: &Client) -> String {
    let email = register(client, "librarian").await;
    login(client, &email).await
}

/// Bearer token for a new account whose fines are settled, so it may borrow
async fn get_paid_token(client: &Client) -> String {
    let email = register(client, "librarian").await;
    let token = login(client, &email).await;

    let response = client
        .put(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "email": email,
            "name": "Test Reader",
            "role": "librarian",
            "fineAmount": 0.0,
            "isPaymentDone": true
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    token
}

async fn create_book(client: &Client, token: &str, books_left: i64) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            // 13 characters, inside the ISBN column width
            "ISBN": Uuid::new_v4().simple().to_string()[..13].to_string(),
            "title": "The Rust Programming Language",
            "author": "Steve Klabnik",
            "genre": "programming",
            "coverImage": "http://covers.example.com/rust.png",
            "booksLeft": books_left,
            "inLibrary": true
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_weak_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": "weak@example.com",
            "name": "Weak",
            "role": "patrons",
            "password": "password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_login_wrong_password() {
    let client = Client::new();
    let email = register(&client, "patrons").await;

    let response = client
        .post(format!("{}/users/login", BASE_URL))
        .json(&json!({ "email": email, "password": "Wrongpass1" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_missing_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Unauthorized. Bearer token required.");
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "librarian");
}

#[tokio::test]
#[ignore]
async fn test_get_book_counts_view() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book = create_book(&client, &token, 2).await;
    let isbn = book["ISBN"].as_str().expect("ISBN");

    let response = client
        .get(format!("{}/books/{}", BASE_URL, isbn))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["views"], 1);
}

#[tokio::test]
#[ignore]
async fn test_checkout_lifecycle() {
    let client = Client::new();
    let token = get_paid_token(&client).await;
    // Two copies, so the second reservation fails on the open ticket and not on stock
    let book = create_book(&client, &token, 2).await;
    let book_id = book["ID"].as_str().expect("book id").to_string();

    // Reserve one copy
    let response = client
        .post(format!("{}/checkouts", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bookID": book_id, "numberOfDays": 7 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let ticket: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(ticket["state"], "reserved");

    // A second open ticket for the same book is refused
    let response = client
        .post(format!("{}/checkouts", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bookID": book_id, "numberOfDays": 7 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duplicate");

    // Check out, then return
    for state in ["checked_out", "returned"] {
        let response = client
            .put(format!("{}/checkouts", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({ "ID": ticket["ID"], "state": state }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    // Returned is terminal
    let response = client
        .put(format!("{}/checkouts", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "ID": ticket["ID"], "state": "reserved" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_review_updates_rating() {
    let client = Client::new();
    let token = get_paid_token(&client).await;
    let book = create_book(&client, &token, 1).await;
    let isbn = book["ISBN"].as_str().expect("ISBN").to_string();

    let response = client
        .post(format!("{}/checkouts", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bookID": book["ID"], "numberOfDays": 3 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let ticket: Value = response.json().await.expect("Failed to parse response");

    let response = client
        .post(format!("{}/reviews", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "bookID": book["ID"],
            "checkoutID": ticket["ID"],
            "commentHeading": "Great",
            "comment": "Clear and thorough",
            "rating": 4
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/books/{}/ratings", BASE_URL, isbn))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let rating: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(rating["totalReviews"], 1);
    assert_eq!(rating["rating"], 4.0);
}

#[tokio::test]
#[ignore]
async fn test_search_requires_known_type() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/search?page=1&limit=5&searchText=rust&type=movie", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_line_graph() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/dashboards/linegraph", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body.as_array().map(|points| points.len()), Some(7));
}

#[tokio::test]
#[ignore]
async fn test_unpaid_user_cannot_checkout() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let book = create_book(&client, &token, 1).await;

    let response = client
        .post(format!("{}/checkouts", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bookID": book["ID"], "numberOfDays": 7 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "PaymentPending");
}

#[tokio::test]
#[ignore]
async fn test_oversized_isbn_is_a_validation_error() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "ISBN": "9".repeat(37),
            "title": "Too long",
            "author": "Nobody",
            "coverImage": "http://covers.example.com/long.png"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}
