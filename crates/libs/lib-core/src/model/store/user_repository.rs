//! # User Repository
//!
//! Database access for user records. Emails are stored exactly as given and
//! compared case-sensitively.

use super::models::User;
use super::DbPool;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::query_as;

const USER_COLUMNS: &str = "id, email, password_hash, is_active, created_at";

pub const EMAIL_TAKEN: &str = "Email already registered";

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by their email address.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
        let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>> {
        let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Create a new, active user.
    ///
    /// # Errors
    ///
    /// [`AppError::Conflict`] when the email is already registered, including
    /// when a concurrent registration wins the UNIQUE index.
    pub async fn create(pool: &DbPool, email: &str, password_hash: &str) -> Result<User> {
        if Self::find_by_email(pool, email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, is_active, created_at) VALUES (?, ?, 1, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(EMAIL_TAKEN.to_string())
            }
            _ => AppError::from(e),
        })?;

        let id = result.last_insert_rowid();

        let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(user)
    }

    /// Activate or deactivate an account. Users are never deleted.
    pub async fn set_active(pool: &DbPool, id: i64, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with ID {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::create_memory_pool;

    #[tokio::test]
    async fn test_create_user() {
        let pool = create_memory_pool().await.unwrap();

        let user = UserRepository::create(&pool, "test@example.com", "hash")
            .await
            .unwrap();

        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.password_hash, "hash");
        assert!(user.is_active);

        let found = UserRepository::find_by_id(&pool, user.id).await.unwrap();
        assert_eq!(found.unwrap().email, "test@example.com");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let pool = create_memory_pool().await.unwrap();
        UserRepository::create(&pool, "test@example.com", "hash").await.unwrap();

        let result = UserRepository::create(&pool, "test@example.com", "other").await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let pool = create_memory_pool().await.unwrap();
        UserRepository::create(&pool, "Alice@x.com", "hash").await.unwrap();

        assert!(UserRepository::find_by_email(&pool, "alice@x.com").await.unwrap().is_none());
        assert!(UserRepository::find_by_email(&pool, "Alice@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_active() {
        let pool = create_memory_pool().await.unwrap();
        let user = UserRepository::create(&pool, "a@x.com", "hash").await.unwrap();

        UserRepository::set_active(&pool, user.id, false).await.unwrap();
        let user = UserRepository::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert!(!user.is_active);

        assert!(matches!(
            UserRepository::set_active(&pool, 999, true).await,
            Err(AppError::NotFound(_))
        ));
    }
}
