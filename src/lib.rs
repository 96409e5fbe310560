//! Tienda Client - Offline-First Sync Core
//!
//! Client core for a field-delivery application: repartidores take orders
//! and log store visits from places with unreliable connectivity, so every
//! write must survive being made offline and reach the server once the
//! network returns.
//!
//! # Overview
//!
//! The crate provides four cooperating pieces:
//!
//! - **Durable local store** (`store`) - sqlite-backed queues for pending
//!   orders and visits, plus cached reference data (products, stores)
//! - **Gateway client** (`api`) - typed async calls for every remote
//!   resource, with one uniform response contract
//! - **Sync engine** (`sync`) - online-first submission, offline queueing,
//!   and a reentrancy-guarded drain that replays queued writes oldest
//!   first with at-least-once delivery
//! - **Cache worker** (`worker`) - versioned resource cache serving
//!   navigations network-first and static assets cache-first, keeping the
//!   app shell usable with no network
//!
//! Connectivity is an explicit observed value (`connectivity`): the host
//! reports transitions, the engine reacts to `Restored` events. Push
//! registration and display live in `notifications`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tienda_client::config::AppConfig;
//! use tienda_client::connectivity::{ConnectivityMonitor, ConnectivityState};
//! use tienda_client::store::LocalStore;
//! use tienda_client::sync::SyncEngine;
//! use tienda_client::api::ApiClient;
//!
//! # async fn example() -> tienda_client::error::Result<()> {
//! let config = AppConfig::builder()
//!     .api_base_url("https://api.example.com/api")
//!     .database_path("tienda.db")
//!     .build()
//!     .map_err(|e| tienda_client::error::ClientError::Config(e.to_string()))?;
//!
//! let store = LocalStore::open(&config.database_path).await?;
//! let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::Online));
//! let engine = Arc::new(SyncEngine::new(
//!     ApiClient::from_config(&config),
//!     store,
//!     monitor.clone(),
//! ));
//! engine.spawn_auto_drain();
//!
//! // Later, when the host detects the network coming back:
//! monitor.set_online();
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`error::Result`]. Gateway rejections
//! carry the server's message ([`error::ClientError::Validation`]); an
//! unreachable network is a [`error::ClientError::Network`] with status 0.
//! Storage failures never take user writes with them: a queued write is
//! deleted only after the server acknowledged it.

/// Client configuration
pub mod config;

/// Error types shared across the crate
pub mod error;

/// Data structures exchanged with the gateway or persisted locally
pub mod models;

/// Durable local store: pending-write queues and cached reference data
pub mod store;

/// Typed client for the remote HTTP gateway
pub mod api;

/// Observed connectivity state and transition events
pub mod connectivity;

/// Online-first submission and queued-write replay
pub mod sync;

/// Versioned resource cache worker for the app shell
pub mod worker;

/// Push-notification registration bridge
pub mod notifications;

pub use api::ApiClient;
pub use config::AppConfig;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, ConnectivityState};
pub use error::{ClientError, Result};
pub use store::LocalStore;
pub use sync::{DrainOutcome, SyncEngine, SyncSummary};
pub use worker::{CacheWorker, ResourceCache};
