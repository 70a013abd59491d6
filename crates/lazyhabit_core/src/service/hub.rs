//! Published in-memory habit document.
//!
//! # Responsibility
//! - Own the single snapshot every screen reads from.
//! - Notify subscribers whenever a new snapshot is published.
//!
//! # Invariants
//! - Subscribers only ever see immutable `Arc<AppData>` snapshots.
//! - Notification order is subscription order.
//! - Publishing happens only after a successful store write (see
//!   `HabitService`); the hub itself never touches storage.

use crate::model::app_data::AppData;
use std::sync::Arc;

/// Handle returned by [`AppDataHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&Arc<AppData>) + Send>;

/// Publish/subscribe holder for the current habit document.
pub struct AppDataHub {
    snapshot: Arc<AppData>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl AppDataHub {
    pub fn new(initial: AppData) -> Self {
        Self {
            snapshot: Arc::new(initial),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Current snapshot; cheap to clone and hold across renders.
    pub fn snapshot(&self) -> Arc<AppData> {
        Arc::clone(&self.snapshot)
    }

    /// Registers a callback for future publishes.
    ///
    /// The callback is not invoked for the current snapshot; callers read it
    /// with [`AppDataHub::snapshot`].
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&Arc<AppData>) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber; returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Replaces the snapshot and notifies every subscriber.
    pub fn publish(&mut self, data: AppData) -> Arc<AppData> {
        self.snapshot = Arc::new(data);
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.snapshot);
        }
        Arc::clone(&self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::AppDataHub;
    use crate::model::app_data::AppData;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn publish_notifies_until_unsubscribed() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut hub = AppDataHub::new(AppData::empty(now));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = hub.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(AppData::empty(now));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.publish(AppData::empty(now));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
