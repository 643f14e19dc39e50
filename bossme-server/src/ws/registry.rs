//! Registry of live push-transport connections
//!
//! Each WebSocket gets a [`ConnectionHandle`] holding its lifecycle state
//! and a bounded outbound queue. The handle is registered once the upgrade
//! completes and removed when the socket closes. The broadcaster only ever
//! sees handles through [`ConnectionRegistry::snapshot`], so the registry lock
//! is never held while frames are offered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifier of a push connection
pub type ConnectionId = Uuid;

/// A serialized frame shared between every connection it is offered to
pub type Frame = Arc<str>;

/// Default capacity of a connection's outbound queue
pub const DEFAULT_SEND_BUFFER: usize = 32;

/// Default time a single socket write may take before the connection is dropped
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

/// Lifecycle of a push connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting = 0,
    /// Registered and accepting frames
    Open = 1,
    /// Terminal
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            _ => Self::Closed,
        }
    }
}

/// Why a frame could not be handed to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The outbound queue is full; the client is not keeping up
    BufferFull,
    /// The connection's receiving side is gone
    Disconnected,
}

/// Per-connection result of offering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Queued for the connection's socket
    Delivered,
    /// Connection was not open; nothing sent
    Skipped(ConnectionState),
    /// Connection could not take the frame and should be evicted
    Dropped(DropReason),
}

/// Handle to one push connection
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    state: AtomicU8,
    tx: mpsc::Sender<Frame>,
    shutdown: CancellationToken,
    connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a handle in the `Connecting` state along with the receiving end
    /// of its outbound queue
    pub fn new(send_buffer: usize) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(send_buffer.max(1));
        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            tx,
            shutdown: CancellationToken::new(),
            connected_at: Utc::now(),
        });
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Move `Connecting -> Open`. Returns false if the handle was not connecting.
    fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting as u8,
                ConnectionState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Closed` and wake the connection task.
    ///
    /// Returns true only for the call that performed the transition.
    pub fn close(&self) -> bool {
        let previous = self
            .state
            .swap(ConnectionState::Closed as u8, Ordering::AcqRel);
        self.shutdown.cancel();
        previous != ConnectionState::Closed as u8
    }

    /// Resolves once [`close`](Self::close) has been called
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }

    /// Offer a frame without waiting
    pub fn offer(&self, frame: Frame) -> DeliveryOutcome {
        let state = self.state();
        if state != ConnectionState::Open {
            return DeliveryOutcome::Skipped(state);
        }

        match self.tx.try_send(frame) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(TrySendError::Full(_)) => DeliveryOutcome::Dropped(DropReason::BufferFull),
            Err(TrySendError::Closed(_)) => DeliveryOutcome::Dropped(DropReason::Disconnected),
        }
    }
}

/// Set of currently registered push connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the handle open and add it to the registry
    ///
    /// A handle that already left `Connecting` (e.g. closed during the
    /// handshake) is not registered; returns whether it was added.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> bool {
        if !handle.mark_open() {
            return false;
        }
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id(), handle);
        true
    }

    /// Remove a connection; removing an unknown id is a no-op
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Every registered handle, regardless of state
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Registered handles that are currently open
    pub fn open_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.snapshot()
            .into_iter()
            .filter(|handle| handle.is_open())
            .collect()
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
