//! User accounts, authentication and book ledgers

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetailsFrom},
        enums::{Genre, Role},
        pagination::{total_pages, SortPagination},
        user::{
            BookDetails, LoginResponse, LoginUser, RegisterUser, UpdateBookDetails, UpdateUser, User,
            UserClaims, UserPage, UserWithBookDetails,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a user. Repeating a registration refreshes name, image and role.
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(Role::Patrons);

        let user = self
            .repository
            .users
            .upsert(&request.email, &request.name, &request.profile_image_url, role, &password_hash)
            .await?;

        tracing::info!("Registered user {} ({})", user.id, user.role);
        Ok(user)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, request: LoginUser) -> AppResult<LoginResponse> {
        let user = self.repository.users.get_by_email(&request.email).await?;

        if !verify_password(&user.password_hash, &request.password)? {
            tracing::debug!("Password mismatch for user {}", user.id);
            return Err(AppError::Authentication("password doesn't match".to_string()));
        }

        let token = UserClaims::new(user.id, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(LoginResponse { token })
    }

    /// Get user with book details
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<UserWithBookDetails> {
        self.repository.users.get_with_book_details(id).await
    }

    /// Sorted page of users
    pub async fn list(&self, query: &SortPagination) -> AppResult<UserPage> {
        let (users, total) = self.repository.users.list(query).await?;
        Ok(UserPage {
            total_pages: total_pages(total, query.limit),
            users,
        })
    }

    /// Update a user's profile
    pub async fn update(&self, id: Uuid, request: &UpdateUser) -> AppResult<User> {
        self.repository.users.update(id, request).await
    }

    /// Replace a user's book ledger
    pub async fn update_book_details(
        &self,
        id: Uuid,
        request: &UpdateBookDetails,
        favorite_genres: &[Genre],
    ) -> AppResult<BookDetails> {
        let genres: Vec<String> = favorite_genres.iter().map(|g| g.as_str().to_string()).collect();
        self.repository.users.update_book_details(id, request, &genres).await
    }

    /// Delete a user account
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Books held in one of the user's lists
    pub async fn books_from(&self, id: Uuid, from: BookDetailsFrom) -> AppResult<Vec<Book>> {
        let isbns = self.repository.users.book_list(id, from).await?;
        self.repository.books.list_by_isbns(&isbns).await
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "Secret123").unwrap());
        assert!(!verify_password(&hash, "Secret124").unwrap());
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(matches!(
            verify_password("not-a-hash", "Secret123"),
            Err(AppError::Internal(_))
        ));
    }
}
