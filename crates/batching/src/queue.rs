use std::time::Duration;

use indexmap::{map::Entry, IndexMap};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Pending<P> {
    payload: P,
    opened_at: Instant,
}

/// Pending operations of one kind, keyed by dedup key.
///
/// Entries are flushed in the order their keys were first inserted. An entry
/// whose window opened at `T` becomes due at `T + interval`.
#[derive(Debug)]
pub struct BatchQueue<P> {
    name: &'static str,
    interval: Duration,
    pending: IndexMap<String, Pending<P>>,
}

impl<P> BatchQueue<P> {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            pending: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn payload(&self, key: &str) -> Option<&P> {
        self.pending.get(key).map(|entry| &entry.payload)
    }

    /// Records `payload` under `key` unless that key is already pending.
    /// Returns `false` on a dedup hit; the earlier payload stays.
    pub fn enqueue(&mut self, key: impl Into<String>, payload: P, now: Instant) -> bool {
        match self.pending.entry(key.into()) {
            Entry::Occupied(entry) => {
                debug!(queue = self.name, key = %entry.key(), "already pending, dropped");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Pending {
                    payload,
                    opened_at: now,
                });
                debug!(queue = self.name, pending = self.pending.len(), "enqueued");
                true
            }
        }
    }

    /// Replaces the payload under `key`, creating the entry if needed. A
    /// replaced entry keeps its window and its flush position.
    pub fn overwrite(&mut self, key: impl Into<String>, payload: P, now: Instant) {
        match self.pending.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().payload = payload,
            Entry::Vacant(entry) => {
                entry.insert(Pending {
                    payload,
                    opened_at: now,
                });
            }
        }
    }

    pub fn cancel(&mut self, key: &str) -> bool {
        let removed = self.pending.shift_remove(key).is_some();
        if removed {
            debug!(queue = self.name, key, "cancelled");
        }
        removed
    }

    /// Removes and returns every entry due at `now`, in insertion order. The
    /// rest stay pending, so anything submitted after this call waits for a
    /// later flush.
    pub fn take_due(&mut self, now: Instant) -> Vec<(String, P)> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let interval = self.interval;
        let mut due = Vec::new();
        for (key, entry) in std::mem::take(&mut self.pending) {
            if entry.opened_at + interval <= now {
                due.push((key, entry.payload));
            } else {
                self.pending.insert(key, entry);
            }
        }
        due
    }

    /// Removes and returns everything pending regardless of due time.
    pub fn drain(&mut self) -> Vec<(String, P)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(key, entry)| (key, entry.payload))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/queue_tests.rs"]
mod tests;
