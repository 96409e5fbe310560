//! # Local Durable Store
//!
//! SQLite-backed storage for offline-first operation. Holds cached reference
//! data (products, stores), the two pending-write queues (orders, visits)
//! and a generic key/value cache.
//!
//! ## Architecture
//!
//! - **Cached reference data**: replaced wholesale each time a fresh list is
//!   fetched online, read back whenever the UI needs it offline
//! - **Pending-write queues**: one row per unacknowledged write, keyed by
//!   temporary identifier and indexed by creation timestamp for ordered
//!   draining
//! - **Key/value cache**: opaque JSON values with a stored timestamp
//!
//! The store is the only shared mutable resource in the system; every
//! logical write is a single storage-layer statement, so no extra locking
//! is required.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tienda_client::store::LocalStore;
//! use tienda_client::models::{NewOrder, OrderItem};
//!
//! # async fn demo() -> tienda_client::error::Result<()> {
//! let store = LocalStore::open("sqlite::memory:").await?;
//!
//! let pending = store.enqueue_order(NewOrder {
//!     client_name: "Ana".to_string(),
//!     store_id: 7,
//!     items: vec![OrderItem { sku: "A1".to_string(), qty: 2 }],
//! }).await?;
//!
//! let queued = store.list_pending_orders().await?;
//! assert_eq!(queued[0].temp_id, pending.temp_id);
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::models::{NewOrder, PendingOrder, PendingVisit, Product, Store, VisitScan};

/// Current local schema version
pub const SCHEMA_VERSION: i32 = 1;

/// A generic cached value with its storage timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// Cache key
    pub key: String,
    /// Opaque cached value
    pub value: serde_json::Value,
    /// When the value was stored, milliseconds since the epoch
    pub timestamp: i64,
}

/// Counts per collection, mirroring the original's offline stats panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub products: u64,
    pub stores: u64,
    pub pending_orders: u64,
    pub pending_visits: u64,
}

/// Local database connection manager
///
/// Owns the SQLite connection and provides the five logical collections.
/// Opening is idempotent: the schema is provisioned on first creation and
/// re-applying it is a no-op.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open or create the local database at `path`.
    ///
    /// Accepts a plain file path, a `sqlite:` URL, or `sqlite::memory:`.
    /// Fails with `StorageUnavailable` when the host denies persistent
    /// storage (file cannot be created or opened).
    pub async fn open(path: &str) -> Result<Self> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{}", path)
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?
            .create_if_missing(true);

        // A single connection keeps in-memory databases coherent and matches
        // the one-connection discipline of the original store. The pool must
        // never reap it: for `sqlite::memory:` the connection IS the
        // database, queues included.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&pool)
            .await
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;

        let store = Self { pool };
        store
            .init_schema()
            .await
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;

        info!("local store ready at {}", url);
        Ok(store)
    }

    /// Apply the schema and record the version. Safe to call repeatedly.
    async fn init_schema(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        if current.0 < SCHEMA_VERSION {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(SCHEMA_VERSION)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Connection pool reference, for components sharing the same file
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Cached reference data
    // ------------------------------------------------------------------

    /// Replace the cached product list with a freshly fetched one.
    ///
    /// Upserts record by record; a partial failure leaves a mixed cache,
    /// which the next successful fetch repairs.
    pub async fn replace_all_products(&self, products: &[Product]) -> Result<()> {
        for product in products {
            sqlx::query("INSERT OR REPLACE INTO products (id, body) VALUES (?, ?)")
                .bind(product.id)
                .bind(serde_json::to_string(product)?)
                .execute(&self.pool)
                .await?;
        }
        debug!("cached {} products", products.len());
        Ok(())
    }

    /// Replace the cached store list with a freshly fetched one
    pub async fn replace_all_stores(&self, stores: &[Store]) -> Result<()> {
        for store in stores {
            sqlx::query("INSERT OR REPLACE INTO stores (id, body) VALUES (?, ?)")
                .bind(store.id)
                .bind(serde_json::to_string(store)?)
                .execute(&self.pool)
                .await?;
        }
        debug!("cached {} stores", stores.len());
        Ok(())
    }

    /// All cached products
    pub async fn products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT body FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(serde_json::from_str(row.get::<String, _>(0).as_str())?))
            .collect()
    }

    /// All cached stores
    pub async fn stores(&self) -> Result<Vec<Store>> {
        let rows = sqlx::query("SELECT body FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(serde_json::from_str(row.get::<String, _>(0).as_str())?))
            .collect()
    }

    // ------------------------------------------------------------------
    // Pending-write queues
    // ------------------------------------------------------------------

    /// Queue an order created while offline and return the stored record
    pub async fn enqueue_order(&self, order: NewOrder) -> Result<PendingOrder> {
        let pending = PendingOrder::new(order);
        sqlx::query("INSERT INTO pending_orders (temp_id, body, created_ms) VALUES (?, ?, ?)")
            .bind(&pending.temp_id)
            .bind(serde_json::to_string(&pending)?)
            .bind(pending.timestamp)
            .execute(&self.pool)
            .await?;
        info!("queued offline order {}", pending.temp_id);
        Ok(pending)
    }

    /// Queue a visit scanned while offline and return the stored record
    pub async fn enqueue_visit(&self, scan: VisitScan) -> Result<PendingVisit> {
        let pending = PendingVisit::new(scan);
        sqlx::query("INSERT INTO pending_visits (temp_id, body, created_ms) VALUES (?, ?, ?)")
            .bind(&pending.temp_id)
            .bind(serde_json::to_string(&pending)?)
            .bind(pending.timestamp)
            .execute(&self.pool)
            .await?;
        info!("queued offline visit {}", pending.temp_id);
        Ok(pending)
    }

    /// Pending orders in ascending timestamp order, ties broken by temp id
    pub async fn list_pending_orders(&self) -> Result<Vec<PendingOrder>> {
        let rows =
            sqlx::query("SELECT body FROM pending_orders ORDER BY created_ms ASC, temp_id ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter()
            .map(|row| Ok(serde_json::from_str(row.get::<String, _>(0).as_str())?))
            .collect()
    }

    /// Pending visits in ascending timestamp order, ties broken by temp id
    pub async fn list_pending_visits(&self) -> Result<Vec<PendingVisit>> {
        let rows =
            sqlx::query("SELECT body FROM pending_visits ORDER BY created_ms ASC, temp_id ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter()
            .map(|row| Ok(serde_json::from_str(row.get::<String, _>(0).as_str())?))
            .collect()
    }

    /// Delete one pending order once acknowledged.
    ///
    /// A no-op when the record is already gone, so duplicate deletes from
    /// overlapping drains never error.
    pub async fn remove_pending_order(&self, temp_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM pending_orders WHERE temp_id = ?")
            .bind(temp_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            debug!("removed synced order {}", temp_id);
        }
        Ok(())
    }

    /// Delete one pending visit once acknowledged; idempotent like
    /// [`remove_pending_order`](Self::remove_pending_order).
    pub async fn remove_pending_visit(&self, temp_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM pending_visits WHERE temp_id = ?")
            .bind(temp_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            debug!("removed synced visit {}", temp_id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Generic key/value cache
    // ------------------------------------------------------------------

    /// Store an opaque value under `key`, stamping the storage time
    pub async fn cache_put(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO cache_data (key, value, created_ms) VALUES (?, ?, ?)")
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Fetch a cached value, if any
    pub async fn cache_get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query("SELECT value, created_ms FROM cache_data WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(CacheEntry {
                key: key.to_string(),
                value: serde_json::from_str(row.get::<String, _>(0).as_str())?,
                timestamp: row.get::<i64, _>(1),
            })),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Per-collection record counts
    pub async fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            let pool = self.pool.clone();
            async move {
                let row: (i64,) = sqlx::query_as(&sql).fetch_one(&pool).await?;
                Ok::<u64, sqlx::Error>(row.0 as u64)
            }
        };

        Ok(StoreStats {
            products: count("products").await?,
            stores: count("stores").await?,
            pending_orders: count("pending_orders").await?,
            pending_visits: count("pending_visits").await?,
        })
    }
}
