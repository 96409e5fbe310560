//! # Synchronization Engine
//!
//! Drains the pending-write queues against the remote gateway once
//! connectivity returns. This is the system's central control flow:
//!
//! - a drain is a no-op while offline ("sync postponed")
//! - one drain runs at a time; a concurrent call reports `AlreadyRunning`
//!   instead of stacking submissions during connectivity flapping
//! - orders drain first, then visits, each in ascending timestamp order
//! - one item failing leaves it queued and moves on; it never aborts the
//!   rest of the queue
//! - a record is deleted only after the gateway accepted it, preserving
//!   at-least-once delivery
//!
//! After a drain that reconciled anything, a [`SyncSummary`] is broadcast
//! so the UI can show the transient "synchronized N orders, M visits"
//! notice.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use crate::error::Result;
use crate::models::{NewOrder, Order, PendingOrder, PendingVisit, Visit, VisitScan};
use crate::store::LocalStore;

/// Counts of reconciled writes after a drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Orders accepted by the gateway during this pass
    pub orders_synced: usize,
    /// Visits accepted by the gateway during this pass
    pub visits_synced: usize,
}

/// Result of a [`SyncEngine::drain`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Offline; nothing was attempted
    Postponed,
    /// Another drain is already in flight
    AlreadyRunning,
    /// The queues were walked; counts of what the gateway accepted
    Completed(SyncSummary),
}

/// Outcome of an online-first write attempt
#[derive(Debug, Clone, PartialEq)]
pub enum OrderSubmission {
    /// The gateway acknowledged the order
    Sent(Order),
    /// The write was queued for a later drain
    Queued(PendingOrder),
}

/// Outcome of an online-first visit scan
#[derive(Debug, Clone, PartialEq)]
pub enum VisitSubmission {
    /// The gateway acknowledged the visit
    Sent(Visit),
    /// The scan was queued for a later drain
    Queued(PendingVisit),
}

/// Replays queued offline writes against the remote gateway
pub struct SyncEngine {
    api: ApiClient,
    store: LocalStore,
    monitor: Arc<ConnectivityMonitor>,
    drain_lock: Mutex<()>,
    summary_tx: broadcast::Sender<SyncSummary>,
}

impl SyncEngine {
    /// Create an engine over the gateway client, the local store and the
    /// connectivity monitor
    pub fn new(api: ApiClient, store: LocalStore, monitor: Arc<ConnectivityMonitor>) -> Self {
        let (summary_tx, _) = broadcast::channel(16);
        Self {
            api,
            store,
            monitor,
            drain_lock: Mutex::new(()),
            summary_tx,
        }
    }

    /// Subscribe to the post-drain summaries
    pub fn subscribe_summaries(&self) -> broadcast::Receiver<SyncSummary> {
        self.summary_tx.subscribe()
    }

    /// The durable local store the engine queues into
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Submit an order, queueing it locally when the write cannot be
    /// delivered right now (offline, or the online attempt failed).
    pub async fn submit_order(&self, order: NewOrder) -> Result<OrderSubmission> {
        if self.monitor.is_online() {
            match self.api.create_order(&order).await {
                Ok(created) => return Ok(OrderSubmission::Sent(created)),
                Err(e) => warn!("online order write failed, queueing: {}", e),
            }
        }
        Ok(OrderSubmission::Queued(self.store.enqueue_order(order).await?))
    }

    /// Submit a visit scan, queueing it locally when the write cannot be
    /// delivered right now.
    pub async fn submit_visit(&self, scan: VisitScan) -> Result<VisitSubmission> {
        if self.monitor.is_online() {
            match self.api.register_scan(&scan).await {
                Ok(visit) => return Ok(VisitSubmission::Sent(visit)),
                Err(e) => warn!("online visit write failed, queueing: {}", e),
            }
        }
        Ok(VisitSubmission::Queued(self.store.enqueue_visit(scan).await?))
    }

    /// Drain both pending-write queues.
    ///
    /// Gateway failures are isolated per item; storage failures propagate,
    /// since continuing without the queue would break the
    /// delete-only-after-acknowledgement invariant.
    pub async fn drain(&self) -> Result<DrainOutcome> {
        let _guard = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(DrainOutcome::AlreadyRunning),
        };

        if !self.monitor.is_online() {
            info!("sync postponed, no connection");
            return Ok(DrainOutcome::Postponed);
        }

        let mut summary = SyncSummary::default();

        let pending_orders = self.store.list_pending_orders().await?;
        info!("draining {} pending orders", pending_orders.len());
        for pending in pending_orders {
            match self.api.create_order(&pending.wire_payload()).await {
                Ok(order) => {
                    self.store.remove_pending_order(&pending.temp_id).await?;
                    summary.orders_synced += 1;
                    info!("order {} reconciled as {}", pending.temp_id, order.id);
                }
                Err(e) => {
                    // Leave the record queued for the next drain.
                    warn!("order {} not reconciled: {}", pending.temp_id, e);
                }
            }
        }

        let pending_visits = self.store.list_pending_visits().await?;
        info!("draining {} pending visits", pending_visits.len());
        for pending in pending_visits {
            match self.api.register_scan(&pending.wire_payload()).await {
                Ok(_) => {
                    self.store.remove_pending_visit(&pending.temp_id).await?;
                    summary.visits_synced += 1;
                    info!("visit {} reconciled", pending.temp_id);
                }
                Err(e) => {
                    warn!("visit {} not reconciled: {}", pending.temp_id, e);
                }
            }
        }

        if summary.orders_synced > 0 || summary.visits_synced > 0 {
            let _ = self.summary_tx.send(summary);
        }
        Ok(DrainOutcome::Completed(summary))
    }

    /// Refresh the locally cached reference data from the gateway so the
    /// UI can read it while offline.
    pub async fn refresh_catalog(&self) -> Result<()> {
        let products = self.api.list_products().await?;
        self.store.replace_all_products(&products).await?;
        let stores = self.api.list_stores().await?;
        self.store.replace_all_stores(&stores).await?;
        info!(
            "catalog refreshed: {} products, {} stores",
            products.len(),
            stores.len()
        );
        Ok(())
    }

    /// Spawn the auto-drain task: one drain per `Restored` transition.
    pub fn spawn_auto_drain(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut events = engine.monitor.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::Restored) => {
                        if let Err(e) = engine.drain().await {
                            error!("auto-drain failed: {}", e);
                        }
                    }
                    Ok(ConnectivityEvent::Lost) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("auto-drain missed {} connectivity events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
