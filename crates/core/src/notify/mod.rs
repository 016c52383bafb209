//! Change notification fan-out, keyed by department.
//!
//! Events carry only the trigger reason, never state: subscribers re-query
//! the engine for authoritative data and poll on their own interval as a
//! fallback, so a dropped or lagged notification delays a refresh without
//! ever corrupting anything.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Default per-department channel capacity.
pub const DEFAULT_NOTIFY_BUFFER: usize = 256;

/// Why a department's state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// A ticket joined the queue.
    Join,
    /// The operator advanced the queue.
    Next,
}

/// A state-change signal scoped to one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub department_id: String,
    pub trigger: Trigger,
}

/// Broadcaster for change events using one tokio broadcast channel per
/// department. Cheaply cloneable; clones share the channel map.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>,
}

impl ChangeNotifier {
    /// Create a new notifier with the given per-department channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity,
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn sender_for(&self, department_id: &str) -> broadcast::Sender<ChangeEvent> {
        let mut channels = self.inner.channels.lock().unwrap();
        channels
            .entry(department_id.to_string())
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .clone()
    }

    /// Broadcast a change for one department.
    pub fn publish(&self, department_id: &str, trigger: Trigger) {
        let event = ChangeEvent {
            department_id: department_id.to_string(),
            trigger,
        };
        trace!(department_id, ?trigger, "change published");
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender_for(department_id).send(event);
    }

    /// Subscribe to one department's change events.
    pub fn subscribe(&self, department_id: &str) -> broadcast::Receiver<ChangeEvent> {
        self.sender_for(department_id).subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let notifier = ChangeNotifier::default();
        let mut rx = notifier.subscribe("dept-1");

        notifier.publish("dept-1", Trigger::Join);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.department_id, "dept-1");
        assert_eq!(event.trigger, Trigger::Join);
    }

    #[tokio::test]
    async fn test_departments_are_isolated() {
        let notifier = ChangeNotifier::default();
        let mut rx_one = notifier.subscribe("dept-1");
        let mut rx_two = notifier.subscribe("dept-2");

        notifier.publish("dept-1", Trigger::Next);

        let event = rx_one.recv().await.unwrap();
        assert_eq!(event.trigger, Trigger::Next);
        assert!(rx_two.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let notifier = ChangeNotifier::default();
        notifier.publish("dept-1", Trigger::Join);

        // A later subscriber only sees what happens after subscribing
        let mut rx = notifier.subscribe("dept-1");
        assert!(rx.try_recv().is_err());

        notifier.publish("dept-1", Trigger::Next);
        assert_eq!(rx.recv().await.unwrap().trigger, Trigger::Next);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let notifier = ChangeNotifier::default();
        let mut rx_a = notifier.subscribe("dept-1");
        let mut rx_b = notifier.subscribe("dept-1");

        notifier.publish("dept-1", Trigger::Join);

        assert_eq!(rx_a.recv().await.unwrap().trigger, Trigger::Join);
        assert_eq!(rx_b.recv().await.unwrap().trigger, Trigger::Join);
    }

    #[tokio::test]
    async fn test_clones_share_channels() {
        let notifier = ChangeNotifier::default();
        let clone = notifier.clone();
        let mut rx = notifier.subscribe("dept-1");

        clone.publish("dept-1", Trigger::Join);
        assert_eq!(rx.recv().await.unwrap().trigger, Trigger::Join);
    }

    #[test]
    fn test_trigger_serialization_tags() {
        assert_eq!(serde_json::to_string(&Trigger::Join).unwrap(), "\"join\"");
        assert_eq!(serde_json::to_string(&Trigger::Next).unwrap(), "\"next\"");
    }
}
