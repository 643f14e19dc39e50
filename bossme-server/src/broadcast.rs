//! Fan-out of update events to every client
//!
//! [`BroadcastService::broadcast`] offers one serialized frame to every
//! registered push connection and records the structured event in the
//! [`UpdateQueue`] for polling clients. Delivery is best-effort and
//! at-most-once: a connection that is not open is skipped, a connection whose
//! outbound queue is full is evicted, and neither affects the rest of the
//! pass. Nothing is retried.

use std::sync::Arc;

use bossme_core::{EventKind, UpdateQueue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, trace, warn};

use crate::ws::{
    BroadcastMessage, ConnectionId, ConnectionRegistry, DeliveryOutcome, DropReason, Frame,
};

/// Tally of one broadcast pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was queued for
    pub delivered: usize,
    /// Registered connections that were not open
    pub skipped: usize,
    /// Connections evicted because they could not take the frame
    pub dropped: Vec<(ConnectionId, DropReason)>,
}

impl BroadcastReport {
    fn record(&mut self, id: ConnectionId, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Skipped(_) => self.skipped += 1,
            DeliveryOutcome::Dropped(reason) => self.dropped.push((id, reason)),
        }
    }
}

/// Distributes update events over both transports
pub struct BroadcastService {
    registry: Arc<ConnectionRegistry>,
    queue: Arc<UpdateQueue>,
}

impl BroadcastService {
    pub fn new(registry: Arc<ConnectionRegistry>, queue: Arc<UpdateQueue>) -> Self {
        Self { registry, queue }
    }

    /// Push `{type, data}` to every open connection and record the event
    ///
    /// The event is recorded exactly once no matter how many connections
    /// exist, including when serialization for the push transport fails.
    #[instrument(name = "broadcast", skip_all, fields(event_kind = tracing::field::Empty))]
    pub fn broadcast(&self, kind: impl Into<EventKind>, payload: Value) -> BroadcastReport {
        let kind = kind.into();
        tracing::Span::current().record("event_kind", kind.as_str());

        let mut report = BroadcastReport::default();
        match serde_json::to_string(&BroadcastMessage::new(&kind, &payload)) {
            Ok(json) => {
                let frame: Frame = Arc::from(json);
                for handle in self.registry.snapshot() {
                    let outcome = handle.offer(Arc::clone(&frame));
                    match outcome {
                        DeliveryOutcome::Delivered => {}
                        DeliveryOutcome::Skipped(state) => {
                            debug!(connection = %handle.id(), ?state, "Skipping connection that is not open");
                        }
                        DeliveryOutcome::Dropped(reason) => {
                            warn!(connection = %handle.id(), ?reason, "Evicting push connection");
                            self.registry.remove(handle.id());
                            handle.close();
                        }
                    }
                    report.record(handle.id(), outcome);
                }
            }
            Err(e) => {
                error!("Failed to serialize broadcast frame: {}", e);
            }
        }

        self.queue.record(kind, payload);

        trace!(
            delivered = report.delivered,
            skipped = report.skipped,
            dropped = report.dropped.len(),
            "Broadcast complete"
        );
        report
    }

    /// Announce a newly published item
    pub fn broadcast_new_item<T: Serialize>(&self, item: &T) -> BroadcastReport {
        self.broadcast(EventKind::NewMeme, to_payload(item))
    }

    /// Announce a change to an already published item
    pub fn broadcast_item_updated<T: Serialize>(&self, item: &T) -> BroadcastReport {
        self.broadcast(EventKind::MemeUpdated, to_payload(item))
    }

    /// The queue polling clients read from
    pub fn queue(&self) -> &Arc<UpdateQueue> {
        &self.queue
    }

    /// The registry push connections live in
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

fn to_payload<T: Serialize>(item: &T) -> Value {
    serde_json::to_value(item).unwrap_or_else(|e| {
        error!("Failed to serialize broadcast payload: {}", e);
        Value::Null
    })
}
