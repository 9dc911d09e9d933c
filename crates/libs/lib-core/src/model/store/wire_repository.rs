//! # Wire Repository
//!
//! Owner-scoped access to wire records. A wire that exists but belongs to
//! someone else is reported exactly like a missing one.
//!
//! Every mutation runs in one transaction, so a dropped request either
//! applies fully or not at all.

use chrono::Utc;
use sqlx::{query_as, SqliteConnection};
use tracing::debug;

use super::models::{
    amount_to_storage, Wire, WireForCreate, WireForUpdate, WirePage, WireRow, WireStatus,
    WIRE_COLUMNS,
};
use super::query::WireQuery;
use super::reference;
use super::DbPool;
use crate::error::{AppError, Result};

/// Result of an update, with the status the wire had before it.
#[derive(Debug, Clone)]
pub struct WireUpdateOutcome {
    pub wire: Wire,
    pub previous_status: WireStatus,
}

impl WireUpdateOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.wire.status
    }
}

pub fn wire_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Wire with ID {id} not found"))
}

pub struct WireRepository;

impl WireRepository {
    /// Allocate a reference number and insert a pending wire.
    pub async fn create(pool: &DbPool, owner: i64, data: WireForCreate) -> Result<Wire> {
        let mut tx = pool.begin().await?;

        let reference_number = reference::allocate(&mut tx).await?;

        let result = sqlx::query(
            "INSERT INTO wires (sender_name, recipient_name, amount, currency, status, \
             reference_number, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&data.sender_name)
        .bind(&data.recipient_name)
        .bind(amount_to_storage(&data.amount))
        .bind(&data.currency)
        .bind(WireStatus::Pending.as_str())
        .bind(&reference_number)
        .bind(owner)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let wire = fetch_by_id(&mut tx, result.last_insert_rowid()).await?;
        tx.commit().await?;

        debug!(wire_id = wire.id, owner, "Created wire {}", wire.reference_number);
        Ok(wire)
    }

    /// Fetch a wire the caller owns.
    pub async fn get_by_id(pool: &DbPool, id: i64, owner: i64) -> Result<Wire> {
        let mut conn = pool.acquire().await?;
        fetch_owned(&mut conn, id, owner).await
    }

    /// Overwrite the supplied fields and stamp `updated_at`.
    ///
    /// Status transitions are unrestricted; any known status may be set.
    pub async fn update(
        pool: &DbPool,
        id: i64,
        owner: i64,
        data: WireForUpdate,
    ) -> Result<WireUpdateOutcome> {
        let mut tx = pool.begin().await?;

        let current = fetch_owned(&mut tx, id, owner).await?;

        let status = data
            .status
            .as_deref()
            .map(|raw| {
                raw.parse::<WireStatus>()
                    .map_err(|_| AppError::InvalidStatus(raw.to_string()))
            })
            .transpose()?;

        let mut updates = Vec::new();
        if data.sender_name.is_some() {
            updates.push("sender_name = ?");
        }
        if data.recipient_name.is_some() {
            updates.push("recipient_name = ?");
        }
        if data.amount.is_some() {
            updates.push("amount = ?");
        }
        if data.currency.is_some() {
            updates.push("currency = ?");
        }
        if status.is_some() {
            updates.push("status = ?");
        }
        updates.push("updated_at = ?");

        let query_str = format!("UPDATE wires SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str);

        if let Some(ref sender_name) = data.sender_name {
            query = query.bind(sender_name);
        }
        if let Some(ref recipient_name) = data.recipient_name {
            query = query.bind(recipient_name);
        }
        if let Some(ref amount) = data.amount {
            query = query.bind(amount_to_storage(amount));
        }
        if let Some(ref currency) = data.currency {
            query = query.bind(currency);
        }
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }

        query.bind(Utc::now()).bind(id).execute(&mut *tx).await?;

        let wire = fetch_by_id(&mut tx, id).await?;
        tx.commit().await?;

        Ok(WireUpdateOutcome {
            wire,
            previous_status: current.status,
        })
    }

    /// Hard delete a wire the caller owns.
    pub async fn delete(pool: &DbPool, id: i64, owner: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM wires WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(wire_not_found(id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// One page of the owner's wires, newest first, plus the total match count.
    pub async fn list(pool: &DbPool, owner: i64, query: &WireQuery) -> Result<WirePage> {
        let status = query.status().map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM wires WHERE created_by = ?1 AND (?2 IS NULL OR status = ?2)",
        )
        .bind(owner)
        .bind(status)
        .fetch_one(pool)
        .await?;

        let rows = query_as::<_, WireRow>(&format!(
            "SELECT {WIRE_COLUMNS} FROM wires \
             WHERE created_by = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY julianday(created_at) DESC, id DESC \
             LIMIT ?3 OFFSET ?4"
        ))
        .bind(owner)
        .bind(status)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .await?;

        let wires = rows
            .into_iter()
            .map(Wire::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(WirePage { wires, total })
    }
}

async fn fetch_owned(conn: &mut SqliteConnection, id: i64, owner: i64) -> Result<Wire> {
    let row = query_as::<_, WireRow>(&format!(
        "SELECT {WIRE_COLUMNS} FROM wires WHERE id = ? AND created_by = ?"
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(&mut *conn)
    .await?;

    row.ok_or_else(|| wire_not_found(id))?.try_into()
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Wire> {
    let row = query_as::<_, WireRow>(&format!("SELECT {WIRE_COLUMNS} FROM wires WHERE id = ?"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    row.try_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::reference::is_reference_number;
    use crate::model::store::{create_memory_pool, UserRepository};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn setup() -> (DbPool, i64, i64) {
        let pool = create_memory_pool().await.unwrap();
        let alice = UserRepository::create(&pool, "alice@x.com", "h").await.unwrap();
        let bob = UserRepository::create(&pool, "bob@x.com", "h").await.unwrap();
        (pool, alice.id, bob.id)
    }

    fn new_wire(amount: &str) -> WireForCreate {
        WireForCreate {
            sender_name: "Alice".to_string(),
            recipient_name: "Bob".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_reference_and_pending() {
        let (pool, alice, _) = setup().await;

        let wire = WireRepository::create(&pool, alice, new_wire("500")).await.unwrap();

        assert!(is_reference_number(&wire.reference_number));
        assert_eq!(wire.status, WireStatus::Pending);
        assert_eq!(wire.amount.to_string(), "500.00");
        assert_eq!(wire.created_by, alice);
        assert!(wire.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_get_is_owner_scoped() {
        let (pool, alice, bob) = setup().await;
        let wire = WireRepository::create(&pool, alice, new_wire("10.00")).await.unwrap();

        assert_eq!(WireRepository::get_by_id(&pool, wire.id, alice).await.unwrap(), wire);
        assert!(matches!(
            WireRepository::get_by_id(&pool, wire.id, bob).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            WireRepository::get_by_id(&pool, 9999, alice).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_fields_and_status() {
        let (pool, alice, _) = setup().await;
        let wire = WireRepository::create(&pool, alice, new_wire("10.00")).await.unwrap();

        let outcome = WireRepository::update(
            &pool,
            wire.id,
            alice,
            WireForUpdate::new().status("completed").sender_name("Carol"),
        )
        .await
        .unwrap();

        assert!(outcome.status_changed());
        assert_eq!(outcome.previous_status, WireStatus::Pending);
        assert_eq!(outcome.wire.status, WireStatus::Completed);
        assert_eq!(outcome.wire.sender_name, "Carol");
        assert_eq!(outcome.wire.recipient_name, "Bob");
        assert_eq!(outcome.wire.reference_number, wire.reference_number);
        assert!(outcome.wire.updated_at.is_some());

        // Any status may follow any other.
        let back = WireRepository::update(&pool, wire.id, alice, WireForUpdate::new().status("pending"))
            .await
            .unwrap();
        assert_eq!(back.wire.status, WireStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_not_found_before_invalid_status() {
        let (pool, alice, bob) = setup().await;
        let wire = WireRepository::create(&pool, alice, new_wire("10.00")).await.unwrap();

        let foreign = WireRepository::update(&pool, wire.id, bob, WireForUpdate::new().status("nope")).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));

        let invalid = WireRepository::update(&pool, wire.id, alice, WireForUpdate::new().status("nope")).await;
        assert!(matches!(invalid, Err(AppError::InvalidStatus(s)) if s == "nope"));

        let unchanged = WireRepository::get_by_id(&pool, wire.id, alice).await.unwrap();
        assert!(unchanged.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, alice, bob) = setup().await;
        let wire = WireRepository::create(&pool, alice, new_wire("10.00")).await.unwrap();

        assert!(matches!(
            WireRepository::delete(&pool, wire.id, bob).await,
            Err(AppError::NotFound(_))
        ));
        WireRepository::delete(&pool, wire.id, alice).await.unwrap();
        assert!(matches!(
            WireRepository::delete(&pool, wire.id, alice).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let (pool, alice, bob) = setup().await;
        let mut ids = Vec::new();
        for i in 1..=7 {
            let wire = WireRepository::create(&pool, alice, new_wire(&format!("{i}.00")))
                .await
                .unwrap();
            ids.push(wire.id);
        }
        WireRepository::create(&pool, bob, new_wire("1.00")).await.unwrap();

        let mut seen = Vec::new();
        for page in 1..=3 {
            let query = WireQuery::new(Some(page), Some(3), None).unwrap();
            let result = WireRepository::list(&pool, alice, &query).await.unwrap();
            assert_eq!(result.total, 7);
            seen.extend(result.wires.into_iter().map(|w| w.id));
        }

        ids.reverse();
        assert_eq!(seen, ids);

        let past_end = WireQuery::new(Some(10), Some(3), None).unwrap();
        let empty = WireRepository::list(&pool, alice, &past_end).await.unwrap();
        assert!(empty.wires.is_empty());
        assert_eq!(empty.total, 7);
    }

    #[tokio::test]
    async fn test_list_status_filter() {
        let (pool, alice, _) = setup().await;
        let first = WireRepository::create(&pool, alice, new_wire("1.00")).await.unwrap();
        WireRepository::create(&pool, alice, new_wire("2.00")).await.unwrap();
        WireRepository::update(&pool, first.id, alice, WireForUpdate::new().status("failed"))
            .await
            .unwrap();

        let failed = WireQuery::new(None, None, Some("failed")).unwrap();
        let result = WireRepository::list(&pool, alice, &failed).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.wires[0].id, first.id);

        let bogus = WireQuery::new(None, None, Some("bogus")).unwrap();
        let all = WireRepository::list(&pool, alice, &WireQuery::default()).await.unwrap();
        let ignored = WireRepository::list(&pool, alice, &bogus).await.unwrap();
        assert_eq!(ignored, all);
        assert_eq!(all.total, 2);
    }
}
