//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::{Genre, Role};
use crate::validation::validate_password;

/// User model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userID")]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub profile_image_url: String,
    pub role: Role,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub joined_date: DateTime<Utc>,
    pub views: i64,
    pub fine_amount: f64,
    pub is_payment_done: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Raw `book_details` row. Favorite genres are stored as free text.
#[derive(Debug, Clone, FromRow)]
pub struct BookDetailsRow {
    pub user_id: Uuid,
    pub pending_books_count: i64,
    pub pending_books_list: Vec<String>,
    pub checked_out_books_count: i64,
    pub checked_out_book_list: Vec<String>,
    pub reserved_books_count: i64,
    pub reserved_book_list: Vec<String>,
    pub completed_books_count: i64,
    pub completed_books_list: Vec<String>,
    pub favorite_genres: Vec<String>,
    pub wishlist_books: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-user ledger of reserved, pending, checked-out, completed and wishlisted books (by ISBN)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub pending_books_count: i64,
    pub pending_books_list: Vec<String>,
    pub checked_out_books_count: i64,
    pub checked_out_book_list: Vec<String>,
    pub reserved_books_count: i64,
    pub reserved_book_list: Vec<String>,
    pub completed_books_count: i64,
    pub completed_books_list: Vec<String>,
    pub favorite_genres: Vec<Genre>,
    pub wishlist_books: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<BookDetailsRow> for BookDetails {
    fn from(row: BookDetailsRow) -> Self {
        let mut favorite_genres: Vec<Genre> = Vec::with_capacity(row.favorite_genres.len());
        for genre in row.favorite_genres.iter().map(|g| Genre::from_legacy(g)) {
            if !favorite_genres.contains(&genre) {
                favorite_genres.push(genre);
            }
        }

        Self {
            user_id: row.user_id,
            pending_books_count: row.pending_books_count,
            pending_books_list: row.pending_books_list,
            checked_out_books_count: row.checked_out_books_count,
            checked_out_book_list: row.checked_out_book_list,
            reserved_books_count: row.reserved_books_count,
            reserved_book_list: row.reserved_book_list,
            completed_books_count: row.completed_books_count,
            completed_books_list: row.completed_books_list,
            favorite_genres,
            wishlist_books: row.wishlist_books,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// User together with the book ledger
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithBookDetails {
    #[serde(flatten)]
    pub user: User,
    pub book_details: Option<BookDetails>,
}

/// A page of users
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub total_pages: u32,
    pub users: Vec<UserWithBookDetails>,
}

/// Compact user projection, used in checkout listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserShort {
    #[serde(rename = "userID")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image_url: String,
    pub role: Role,
    pub fine_amount: f64,
}

impl From<User> for UserShort {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            profile_image_url: user.profile_image_url,
            role: user.role,
            fine_amount: user.fine_amount,
        }
    }
}

/// Register user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[serde(default)]
    #[validate(length(min = 1), email)]
    pub email: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(required)]
    pub role: Option<Role>,
    #[serde(default)]
    #[validate(length(min = 8, max = 20), custom(function = "validate_password"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginUser {
    #[serde(default)]
    #[validate(length(min = 1), email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 20), custom(function = "validate_password"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Update the authenticated user's profile
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default)]
    #[validate(length(min = 1), email)]
    pub email: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub name: String,
    #[validate(required)]
    pub role: Option<Role>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub joined_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub views: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fine_amount: f64,
    #[serde(default)]
    pub is_payment_done: bool,
}

/// Replace the authenticated user's book ledger
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBookDetails {
    pub pending_books_list: Vec<String>,
    pub checked_out_book_list: Vec<String>,
    pub reserved_book_list: Vec<String>,
    pub completed_books_list: Vec<String>,
    /// Must name known genres
    pub favorite_genres: Vec<String>,
    pub wishlist_books: Vec<String>,
}

/// JWT claims: subject is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: Uuid, expiration_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(expiration_hours as i64)).timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token (HS256 only, expiry enforced)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let user_id = Uuid::new_v4();
        let claims = UserClaims::new(user_id, 1);
        let token = claims.create_token("secret").unwrap();

        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, user_id.to_string());
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = UserClaims::new(Uuid::new_v4(), 1).create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token() {
        let mut claims = UserClaims::new(Uuid::new_v4(), 1);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = claims.create_token("secret").unwrap();

        let err = UserClaims::from_token(&token, "secret").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_legacy_favorite_genres() {
        let row = BookDetailsRow {
            user_id: Uuid::new_v4(),
            pending_books_count: 0,
            pending_books_list: vec![],
            checked_out_books_count: 0,
            checked_out_book_list: vec![],
            reserved_books_count: 0,
            reserved_book_list: vec![],
            completed_books_count: 0,
            completed_books_list: vec![],
            favorite_genres: vec!["Sci-Fi".into(), "science_fiction".into(), "Poems".into(), "???".into()],
            wishlist_books: vec![],
            created_at: Utc::now(),
            updated_at: None,
        };

        let details = BookDetails::from(row);
        assert_eq!(
            details.favorite_genres,
            vec![Genre::ScienceFiction, Genre::Poetry, Genre::Other]
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "reader@example.com".into(),
            name: "Reader".into(),
            profile_image_url: String::new(),
            role: Role::Patrons,
            date_of_birth: None,
            phone_number: None,
            address: None,
            country: None,
            joined_date: Utc::now(),
            views: 0,
            fine_amount: 0.0,
            is_payment_done: true,
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
            updated_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["userID"], user.id.to_string());
        assert_eq!(json["role"], "patrons");
    }
}
