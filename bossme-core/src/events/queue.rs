//! Bounded in-memory update queue
//!
//! UpdateQueue keeps the most recent events in a ring buffer so clients on
//! the polling transport can ask for "everything since T". It is the only
//! record of past broadcasts: nothing is persisted and a restart starts
//! from an empty buffer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::clock::{Clock, SystemClock};
use super::types::{EventKind, Timestamp, UpdateEvent};

/// Default number of events retained
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

struct Inner {
    events: VecDeque<UpdateEvent>,
    /// Highest timestamp handed out so far
    last_stamp: Timestamp,
    /// Highest cursor returned to a reader; later events must sort after it
    last_served: Timestamp,
}

/// Ring buffer of recent update events
///
/// - Insert appends and evicts the oldest entry once `capacity` is exceeded.
/// - Timestamps are non-decreasing in insertion order, even if the wall clock
///   steps backwards.
/// - An event recorded after a cursor was issued is stamped strictly after
///   that cursor, so `since = cursor` never skips it.
/// - A reader whose `since` predates the oldest retained event gets the whole
///   buffer with no indication that older events were evicted.
pub struct UpdateQueue {
    inner: Mutex<Inner>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl UpdateQueue {
    /// Create a queue with the given capacity (minimum 1) using the system clock
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Create a queue stamping events from a custom clock
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity),
                last_stamp: Timestamp::MIN,
                last_served: Timestamp::MIN,
            }),
            capacity,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The guarded section never panics midway, so a poisoned lock still
        // holds a consistent buffer.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamp and append an event, evicting the oldest if over capacity
    pub fn record(&self, kind: impl Into<EventKind>, payload: Value) -> UpdateEvent {
        let now = self.clock.now_millis();
        let mut inner = self.lock();

        let timestamp = now
            .max(inner.last_stamp)
            .max(inner.last_served.saturating_add(1));
        inner.last_stamp = timestamp;

        let event = UpdateEvent {
            kind: kind.into(),
            payload,
            timestamp,
        };
        inner.events.push_back(event.clone());
        while inner.events.len() > self.capacity {
            if let Some(evicted) = inner.events.pop_front() {
                tracing::trace!(
                    kind = %evicted.kind,
                    timestamp = evicted.timestamp,
                    "Evicted update from queue"
                );
            }
        }

        event
    }

    /// All retained events with `timestamp > since`, oldest first
    pub fn query(&self, since: Timestamp) -> Vec<UpdateEvent> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.timestamp > since)
            .cloned()
            .collect()
    }

    /// Retained events with `timestamp > since` plus the cursor to poll from next
    ///
    /// The cursor is at least the newest returned timestamp, and every event
    /// recorded afterwards is stamped above it.
    pub fn query_with_cursor(&self, since: Timestamp) -> (Vec<UpdateEvent>, Timestamp) {
        let now = self.clock.now_millis();
        let mut inner = self.lock();

        let cursor = now.max(inner.last_stamp);
        inner.last_served = inner.last_served.max(cursor);

        let events = inner
            .events
            .iter()
            .filter(|event| event.timestamp > since)
            .cloned()
            .collect();
        (events, cursor)
    }

    /// Drop every retained event
    pub fn clear(&self) {
        self.lock().events.clear();
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp of the oldest retained event
    pub fn oldest_timestamp(&self) -> Option<Timestamp> {
        self.lock().events.front().map(|event| event.timestamp)
    }

    /// Current time according to the queue's clock
    pub fn now_millis(&self) -> Timestamp {
        self.clock.now_millis()
    }
}

impl Default for UpdateQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl std::fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ManualClock;
    use serde_json::json;

    fn queue_at(capacity: usize, start: Timestamp) -> (UpdateQueue, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let queue = UpdateQueue::with_clock(capacity, clock.clone());
        (queue, clock)
    }

    // ==================== Record Tests ====================

    #[test]
    fn record_stamps_with_clock_time() {
        let (queue, _clock) = queue_at(10, 1234);

        let event = queue.record(EventKind::NewMeme, json!({"id": "m1"}));

        assert_eq!(event.timestamp, 1234);
        assert_eq!(event.kind, EventKind::NewMeme);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn record_beyond_capacity_keeps_last_n_in_order() {
        let (queue, clock) = queue_at(3, 0);

        for n in 0..5 {
            clock.advance(1);
            queue.record("x", json!({ "n": n }));
        }

        let events = queue.query(0);
        let ns: Vec<_> = events.iter().map(|e| e.payload["n"].clone()).collect();
        assert_eq!(ns, vec![json!(2), json!(3), json!(4)]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn capacity_is_clamped_to_one() {
        let (queue, _clock) = queue_at(0, 5);
        assert_eq!(queue.capacity(), 1);

        queue.record("a", json!(1));
        queue.record("b", json!(2));

        let events = queue.query(0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Custom("b".to_string()));
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let (queue, clock) = queue_at(10, 100);

        let a = queue.record("a", Value::Null);
        let b = queue.record("b", Value::Null);
        clock.advance(5);
        let c = queue.record("c", Value::Null);

        assert!(b.timestamp >= a.timestamp);
        assert!(c.timestamp >= b.timestamp);
        assert_eq!(a.timestamp, b.timestamp);
    }

    #[test]
    fn backwards_clock_is_clamped_to_last_stamp() {
        let (queue, clock) = queue_at(10, 500);

        let first = queue.record("a", Value::Null);
        clock.set(100);
        let second = queue.record("b", Value::Null);

        assert_eq!(first.timestamp, 500);
        assert_eq!(second.timestamp, 500);
    }

    // ==================== Query Tests ====================

    fn queue_with_stamps(stamps: &[Timestamp]) -> UpdateQueue {
        let clock = Arc::new(ManualClock::new(0));
        let queue = UpdateQueue::with_clock(100, clock.clone());
        for stamp in stamps {
            clock.set(*stamp);
            queue.record("x", json!({ "at": stamp }));
        }
        queue
    }

    #[test]
    fn query_returns_events_strictly_after_since() {
        let queue = queue_with_stamps(&[10, 20, 30]);

        let stamps: Vec<_> = queue.query(15).iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![20, 30]);
    }

    #[test]
    fn query_at_latest_stamp_is_empty() {
        let queue = queue_with_stamps(&[10, 20, 30]);
        assert!(queue.query(30).is_empty());
    }

    #[test]
    fn query_zero_returns_everything() {
        let queue = queue_with_stamps(&[10, 20, 30]);
        assert_eq!(queue.query(0).len(), 3);
    }

    #[test]
    fn query_on_empty_queue_is_empty() {
        let queue = UpdateQueue::default();
        assert!(queue.query(0).is_empty());
        assert!(queue.is_empty());
        assert_eq!(queue.oldest_timestamp(), None);
    }

    #[test]
    fn query_is_idempotent_without_new_records() {
        let queue = queue_with_stamps(&[10, 20, 30]);

        let first = queue.query(10);
        let second = queue.query(10);

        assert_eq!(first, second);
    }

    #[test]
    fn query_older_than_retained_history_returns_truncated_buffer() {
        // Eviction is silent: a poller from t=0 cannot tell that 10 and 20
        // ever existed.
        let clock = Arc::new(ManualClock::new(0));
        let queue = UpdateQueue::with_clock(2, clock.clone());
        for stamp in [10, 20, 30, 40] {
            clock.set(stamp);
            queue.record("x", Value::Null);
        }

        let stamps: Vec<_> = queue.query(5).iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![30, 40]);
        assert_eq!(queue.oldest_timestamp(), Some(30));
    }

    #[test]
    fn cursor_covers_everything_returned() {
        let queue = queue_with_stamps(&[10, 20, 30]);

        let (events, cursor) = queue.query_with_cursor(0);

        assert_eq!(events.len(), 3);
        assert!(cursor >= 30);
    }

    #[test]
    fn event_in_same_millisecond_as_cursor_is_not_skipped() {
        let (queue, _clock) = queue_at(10, 100);

        let (events, cursor) = queue.query_with_cursor(0);
        assert!(events.is_empty());
        assert_eq!(cursor, 100);

        // Clock has not moved since the cursor was issued
        let event = queue.record("x", Value::Null);
        assert!(event.timestamp > cursor);

        let (next, _) = queue.query_with_cursor(cursor);
        assert_eq!(next, vec![event]);
    }

    #[test]
    fn cursor_never_trails_a_clamped_stamp() {
        let (queue, clock) = queue_at(10, 500);
        queue.record("a", Value::Null);
        clock.set(100);

        let (_, cursor) = queue.query_with_cursor(0);

        assert_eq!(cursor, 500);
        assert!(queue.query_with_cursor(cursor).0.is_empty());
    }

    // ==================== Clear Tests ====================

    #[test]
    fn clear_empties_queue() {
        let queue = queue_with_stamps(&[1, 2, 3]);

        queue.clear();

        assert!(queue.is_empty());
        assert!(queue.query(0).is_empty());
    }

    #[test]
    fn clear_keeps_timestamps_monotonic() {
        let clock = Arc::new(ManualClock::new(50));
        let queue = UpdateQueue::with_clock(10, clock.clone());
        queue.record("a", Value::Null);

        queue.clear();
        clock.set(20);
        let event = queue.record("b", Value::Null);

        assert_eq!(event.timestamp, 50);
    }

    // ==================== Concurrent Access Tests ====================

    #[tokio::test]
    async fn concurrent_records_respect_capacity() {
        let queue = Arc::new(UpdateQueue::new(50));
        let mut handles = vec![];

        for i in 0..10 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    queue.record("x", json!({ "task": i, "n": j }));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let events = queue.query(Timestamp::MIN);
        assert_eq!(events.len(), 50);
        assert!(
            events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "stored timestamps must be non-decreasing"
        );
    }
}
