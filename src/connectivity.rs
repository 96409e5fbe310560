//! # Connectivity Monitor
//!
//! Translates the host platform's online/offline signal into an explicit
//! `ConnectivityState` value plus discrete transition events. The state is
//! a live mirror, not a stored entity: host adapters feed every platform
//! signal in, duplicate signals in the same state are suppressed, and each
//! real transition is broadcast exactly once.
//!
//! The sync engine observes the monitor two ways: it reads the current
//! state at the start of a drain, and it subscribes to `Restored` events to
//! trigger a drain once per reconnection.

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

/// Reachability of the remote gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn is_online(self) -> bool {
        self == ConnectivityState::Online
    }
}

/// A reachability transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The connection came back
    Restored,
    /// The connection dropped
    Lost,
}

/// Observes platform connectivity signals and raises transition events
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state_tx: watch::Sender<ConnectivityState>,
    events_tx: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the platform's currently reported state
    pub fn new(initial: ConnectivityState) -> Self {
        let (state_tx, _) = watch::channel(initial);
        let (events_tx, _) = broadcast::channel(16);
        Self { state_tx, events_tx }
    }

    /// Current state
    pub fn state(&self) -> ConnectivityState {
        *self.state_tx.borrow()
    }

    /// Whether the gateway is currently reachable
    pub fn is_online(&self) -> bool {
        self.state().is_online()
    }

    /// A live view of the state for components that poll it
    pub fn watch(&self) -> watch::Receiver<ConnectivityState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to transition events
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events_tx.subscribe()
    }

    /// Host adapter entry point: the platform reported the network is up.
    /// Emits `Restored` only when this is an actual transition.
    pub fn set_online(&self) {
        if self.transition(ConnectivityState::Online) {
            info!("connection restored");
            let _ = self.events_tx.send(ConnectivityEvent::Restored);
        }
    }

    /// Host adapter entry point: the platform reported the network is down.
    /// Emits `Lost` only when this is an actual transition.
    pub fn set_offline(&self) {
        if self.transition(ConnectivityState::Offline) {
            warn!("connection lost, entering offline mode");
            let _ = self.events_tx.send(ConnectivityEvent::Lost);
        }
    }

    fn transition(&self, next: ConnectivityState) -> bool {
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(ConnectivityState::Online)
    }
}
