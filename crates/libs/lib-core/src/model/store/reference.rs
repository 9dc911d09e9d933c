//! # Reference Numbers
//!
//! Human-readable wire identifiers of the form `WIRE-XXXXXXXXXXXX`, twelve
//! characters drawn uniformly from `A-Z0-9` with the OS random source.
//!
//! Allocation only reads: the caller inserts the row on the same connection,
//! inside the same transaction, and the UNIQUE index has the final word.

use rand::rngs::OsRng;
use rand::Rng;
use sqlx::SqliteConnection;
use tracing::warn;

use crate::error::{AppError, Result};

pub const REFERENCE_PREFIX: &str = "WIRE-";
pub const REFERENCE_BODY_LEN: usize = 12;
pub const MAX_ALLOCATION_ATTEMPTS: usize = 5;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw a fresh candidate. Uniqueness is not checked.
pub fn generate_reference_number() -> String {
    let mut rng = OsRng;
    let body: String = (0..REFERENCE_BODY_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{REFERENCE_PREFIX}{body}")
}

/// True when `value` has the `WIRE-` + 12 × `[A-Z0-9]` shape.
pub fn is_reference_number(value: &str) -> bool {
    value
        .strip_prefix(REFERENCE_PREFIX)
        .map(|body| {
            body.len() == REFERENCE_BODY_LEN
                && body.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Allocate a reference number not yet used by any stored wire.
pub async fn allocate(conn: &mut SqliteConnection) -> Result<String> {
    allocate_with(conn, generate_reference_number).await
}

/// Allocate using `generate` for candidates, giving up after
/// [`MAX_ALLOCATION_ATTEMPTS`] collisions.
pub async fn allocate_with<F>(conn: &mut SqliteConnection, mut generate: F) -> Result<String>
where
    F: FnMut() -> String,
{
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let candidate = generate();
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wires WHERE reference_number = ?)")
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await?;

        if !taken {
            return Ok(candidate);
        }
        warn!(attempt, "Reference number collision: {}", candidate);
    }

    Err(AppError::Storage(format!(
        "Reference number allocation exhausted after {MAX_ALLOCATION_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::create_memory_pool;
    use std::collections::HashSet;

    #[test]
    fn test_generated_shape() {
        for _ in 0..200 {
            let reference = generate_reference_number();
            assert!(is_reference_number(&reference), "bad reference {reference}");
        }
    }

    #[test]
    fn test_generated_are_distinct() {
        let refs: HashSet<String> = (0..1000).map(|_| generate_reference_number()).collect();
        assert_eq!(refs.len(), 1000);
    }

    #[test]
    fn test_is_reference_number_rejects() {
        assert!(!is_reference_number("WIRE-abcdef123456"));
        assert!(!is_reference_number("WIRE-ABC"));
        assert!(!is_reference_number("XFER-ABCDEF123456"));
    }

    async fn seed_reference(pool: &crate::DbPool, reference: &str) {
        sqlx::query("INSERT INTO users (email, password_hash, created_at) VALUES ('r@x.com', 'h', '2025-01-01T00:00:00Z')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO wires (sender_name, recipient_name, amount, currency, status, reference_number, created_by, created_at) \
             VALUES ('A', 'B', '1.00', 'USD', 'pending', ?, 1, '2025-01-01T00:00:00Z')",
        )
        .bind(reference)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_allocate_retries_past_collision() {
        let pool = create_memory_pool().await.unwrap();
        seed_reference(&pool, "WIRE-AAAAAAAAAAAA").await;

        let mut candidates = vec!["WIRE-BBBBBBBBBBBB", "WIRE-AAAAAAAAAAAA"];
        let mut conn = pool.acquire().await.unwrap();
        let allocated = allocate_with(&mut conn, || candidates.pop().unwrap().to_string())
            .await
            .unwrap();

        assert_eq!(allocated, "WIRE-BBBBBBBBBBBB");
    }

    #[tokio::test]
    async fn test_allocate_gives_up() {
        let pool = create_memory_pool().await.unwrap();
        seed_reference(&pool, "WIRE-AAAAAAAAAAAA").await;

        let mut calls = 0;
        let mut conn = pool.acquire().await.unwrap();
        let result = allocate_with(&mut conn, || {
            calls += 1;
            "WIRE-AAAAAAAAAAAA".to_string()
        })
        .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(calls, MAX_ALLOCATION_ATTEMPTS);
    }
}
