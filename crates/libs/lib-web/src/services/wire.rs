//! # Wire Service
//!
//! Orchestrates a wire operation across the store, the cache, the WebSocket
//! registry and the background worker.
//!
//! ```text
//! handler -> WireService -> WireRepository (commit)
//!                        -> CacheService   (invalidate after commit)
//!                        -> ConnectionRegistry (status changes)
//!                        -> TaskQueue      (processing, notifications)
//! ```
//!
//! Reads go to the cache first and repopulate it on a miss. A list page read
//! concurrently with a write may be repopulated from the pre-write state; it
//! stays stale for at most one TTL.

use std::sync::Arc;

use lib_core::dto::{WireCreateRequest, WireListResponse, WireUpdateRequest, WsEvent};
use lib_core::model::store::{WireQuery, WireRepository, WireUpdateOutcome};
use lib_core::model::{User, Wire};
use lib_core::{CacheService, DbPool, Result};
use tracing::{debug, info, instrument};

use crate::worker::{Job, TaskQueue};
use crate::ws::ConnectionRegistry;

#[derive(Clone)]
pub struct WireService {
    db: DbPool,
    cache: CacheService,
    registry: Arc<ConnectionRegistry>,
    tasks: TaskQueue,
    audit: bool,
}

impl WireService {
    pub fn new(
        db: DbPool,
        cache: CacheService,
        registry: Arc<ConnectionRegistry>,
        tasks: TaskQueue,
        audit: bool,
    ) -> Self {
        Self {
            db,
            cache,
            registry,
            tasks,
            audit,
        }
    }

    #[instrument(skip(self, user, req), fields(user_id = user.id))]
    pub async fn create(&self, user: &User, req: WireCreateRequest) -> Result<Wire> {
        let wire = WireRepository::create(&self.db, user.id, req.into()).await?;
        info!(wire_id = wire.id, reference = %wire.reference_number, "[WIRES] Wire created");

        self.cache.invalidate_user_wires(user.id).await;
        self.tasks.enqueue(Job::ProcessWire { wire_id: wire.id });

        if self.audit {
            info!(target: "audit", action = "wire.create", wire_id = wire.id, user_id = user.id, amount = %wire.amount, currency = %wire.currency);
        }
        Ok(wire)
    }

    #[instrument(skip(self, user), fields(user_id = user.id, page = query.page(), status = query.status_label()))]
    pub async fn list(&self, user: &User, query: WireQuery) -> Result<WireListResponse> {
        if let Some(page) = self.cache.get_user_wires(user.id, &query).await {
            debug!("[WIRES] List served from cache");
            return Ok(WireListResponse::new(page, &query, true));
        }

        let page = WireRepository::list(&self.db, user.id, &query).await?;
        self.cache.set_user_wires(user.id, &query, &page).await;
        Ok(WireListResponse::new(page, &query, false))
    }

    pub async fn get(&self, user: &User, wire_id: i64) -> Result<Wire> {
        if let Some(wire) = self.cache.get_wire(wire_id, user.id).await {
            debug!(wire_id, "[WIRES] Wire served from cache");
            return Ok(wire);
        }

        let wire = WireRepository::get_by_id(&self.db, wire_id, user.id).await?;
        self.cache.set_wire(&wire).await;
        Ok(wire)
    }

    /// Apply a partial update. A status change is broadcast to every socket
    /// and queues a notification to the owner.
    #[instrument(skip(self, user, req), fields(user_id = user.id))]
    pub async fn update(&self, user: &User, wire_id: i64, req: WireUpdateRequest) -> Result<Wire> {
        let outcome = WireRepository::update(&self.db, wire_id, user.id, req.into()).await?;

        self.cache.invalidate_user_wires(user.id).await;
        self.cache.invalidate_wire(wire_id).await;

        let changed = outcome.status_changed();
        let WireUpdateOutcome {
            wire,
            previous_status,
        } = outcome;

        if changed {
            info!(
                wire_id,
                from = %previous_status,
                to = %wire.status,
                "[WIRES] Status changed"
            );
            let delivered = self
                .registry
                .broadcast(&WsEvent::wire_update(wire.id, wire.status, user.id))
                .await;
            debug!(wire_id, delivered, "[WIRES] Status update broadcast");

            self.tasks.enqueue(Job::SendWireNotification {
                wire_id: wire.id,
                email: user.email.clone(),
                status: wire.status,
            });
        }

        if self.audit {
            info!(target: "audit", action = "wire.update", wire_id, user_id = user.id, status = %wire.status);
        }
        Ok(wire)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete(&self, user: &User, wire_id: i64) -> Result<()> {
        WireRepository::delete(&self.db, wire_id, user.id).await?;
        info!(wire_id, "[WIRES] Wire deleted");

        self.cache.invalidate_user_wires(user.id).await;
        self.cache.invalidate_wire(wire_id).await;

        if self.audit {
            info!(target: "audit", action = "wire.delete", wire_id, user_id = user.id);
        }
        Ok(())
    }
}
