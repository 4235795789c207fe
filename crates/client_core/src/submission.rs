use std::sync::Arc;

use batching::{spawn_flush_loop, FlushSchedule, Mutation, MutationQueues};
use parking_lot::Mutex;
use shared::{
    domain::{ItemId, OperationKind},
    protocol::QueueStats,
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use crate::SubmissionTransport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Client-side batching in front of a [`SubmissionTransport`]. Same cadence,
/// dedup and select/deselect cancellation as the server's queues; a failed
/// send is logged and dropped.
pub struct SubmissionQueue<T> {
    transport: T,
    schedule: FlushSchedule,
    queues: Mutex<MutationQueues>,
}

impl<T: SubmissionTransport> SubmissionQueue<T> {
    pub fn new(transport: T, schedule: FlushSchedule) -> Self {
        Self {
            transport,
            schedule,
            queues: Mutex::new(MutationQueues::new(schedule)),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn queue_add(&self, id: ItemId) -> bool {
        self.queues.lock().add_item(id, Instant::now())
    }

    pub fn queue_select(&self, id: ItemId) -> bool {
        self.queues.lock().select(id, Instant::now())
    }

    pub fn queue_deselect(&self, id: ItemId) -> bool {
        self.queues.lock().deselect(id, Instant::now())
    }

    pub fn queue_reorder(&self, order: Vec<ItemId>) {
        self.queues.lock().reorder(order, Instant::now());
    }

    pub fn pending(&self) -> QueueStats {
        self.queues.lock().stats()
    }

    pub async fn flush_due(&self, kind: OperationKind) -> FlushOutcome {
        let batch = self.queues.lock().take_due(kind, Instant::now());
        self.send(batch).await
    }

    /// Sends everything pending right away, kind by kind.
    pub async fn flush_all(&self) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();
        for kind in OperationKind::ALL {
            let batch = self.queues.lock().drain(kind);
            let sent = self.send(batch).await;
            outcome.sent += sent.sent;
            outcome.failed += sent.failed;
        }
        outcome
    }

    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>>
    where
        T: 'static,
    {
        OperationKind::ALL
            .into_iter()
            .map(|kind| {
                let queue = Arc::clone(self);
                spawn_flush_loop(
                    kind.as_str(),
                    self.schedule.interval(kind),
                    shutdown.clone(),
                    move || {
                        let queue = Arc::clone(&queue);
                        async move {
                            queue.flush_due(kind).await;
                        }
                    },
                )
            })
            .collect()
    }

    async fn send(&self, batch: Vec<(String, Mutation)>) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();
        for (key, mutation) in batch {
            let result = match &mutation {
                Mutation::AddItem(id) => self.transport.send_add(*id).await,
                Mutation::Select(id) => self.transport.send_select(*id).await,
                Mutation::Deselect(id) => self.transport.send_deselect(*id).await,
                Mutation::Reorder(order) => self.transport.send_reorder(order).await,
            };
            match result {
                Ok(()) => outcome.sent += 1,
                Err(error) if error.is_already_queued() => {
                    outcome.sent += 1;
                    debug!(%key, "server already holds this operation");
                }
                Err(error) => {
                    outcome.failed += 1;
                    warn!(kind = %mutation.kind(), %key, %error, "submission dropped");
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
