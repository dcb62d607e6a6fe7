//! Subscriber set with isolated fan-out.

use dashmap::DashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::observability::metrics;
use crate::subscription::{StatusEvent, SubscriberCallbackError, SubscriberError, SubscriberId};

/// Shared subscriber callback.
pub type Callback = Arc<dyn Fn(&StatusEvent) -> Result<(), SubscriberError> + Send + Sync>;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    subscribers: DashMap<SubscriberId, Callback>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Returns false (and keeps the existing callback) if the id is taken.
    pub fn insert(&self, id: SubscriberId, callback: Callback) -> bool {
        match self.subscribers.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                tracing::debug!(subscriber = %id, "Subscriber already registered");
                false
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(callback);
                tracing::debug!(subscriber = %id, "Subscriber added");
                true
            }
        }
    }

    /// Remove a subscriber. No-op if absent.
    pub fn remove(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "Subscriber removed");
        }
        removed
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&self) {
        self.subscribers.clear();
    }

    /// Deliver an event to every current subscriber.
    pub fn notify(&self, event: &StatusEvent) -> DispatchReport {
        // Snapshot first: no shard lock is held while callbacks run.
        let targets: Vec<(SubscriberId, Callback)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut report = DispatchReport::default();
        for (id, callback) in targets {
            match invoke(id, &callback, event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "Subscriber callback failed");
                    report.failed += 1;
                }
            }
        }

        metrics::record_notifications(report.delivered, report.failed);
        report
    }
}

/// Run one callback, converting errors and panics.
pub fn invoke(
    id: SubscriberId,
    callback: &Callback,
    event: &StatusEvent,
) -> Result<(), SubscriberCallbackError> {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(SubscriberCallbackError::Failed { id, source }),
        Err(payload) => Err(SubscriberCallbackError::Panicked {
            id,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
