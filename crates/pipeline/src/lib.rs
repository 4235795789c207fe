//! Server-side mutation pipeline: validated submissions go into per-kind
//! batching queues, and recurring flushes apply them to the store.

use std::sync::Arc;

use batching::{spawn_flush_loop, FlushSchedule, Mutation, MutationQueues};
use parking_lot::Mutex;
use shared::{
    domain::{validate_order, ItemId, OperationKind},
    error::ValidationError,
    protocol::{ItemsPage, PageQuery, QueueStats},
};
use storage::{ItemStore, SharedStore, StoreError};
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    /// The same operation is already waiting for the next flush.
    AlreadyPending,
}

impl Submission {
    fn from_enqueued(enqueued: bool) -> Self {
        if enqueued {
            Submission::Queued
        } else {
            Submission::AlreadyPending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub kind: OperationKind,
    pub applied: usize,
    pub rejected: usize,
}

impl FlushReport {
    fn empty(kind: OperationKind) -> Self {
        Self {
            kind,
            applied: 0,
            rejected: 0,
        }
    }
}

pub struct MutationPipeline {
    store: SharedStore,
    schedule: FlushSchedule,
    queues: Mutex<MutationQueues>,
}

impl MutationPipeline {
    pub fn new(store: SharedStore, schedule: FlushSchedule) -> Self {
        Self {
            store,
            schedule,
            queues: Mutex::new(MutationQueues::new(schedule)),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn schedule(&self) -> FlushSchedule {
        self.schedule
    }

    pub fn submit_add(&self, id: ItemId) -> Result<Submission, ValidationError> {
        ensure_positive(id)?;
        let enqueued = self.queues.lock().add_item(id, Instant::now());
        Ok(Submission::from_enqueued(enqueued))
    }

    pub fn submit_select(&self, id: ItemId) -> Result<Submission, ValidationError> {
        ensure_positive(id)?;
        let enqueued = self.queues.lock().select(id, Instant::now());
        Ok(Submission::from_enqueued(enqueued))
    }

    pub fn submit_deselect(&self, id: ItemId) -> Result<Submission, ValidationError> {
        ensure_positive(id)?;
        let enqueued = self.queues.lock().deselect(id, Instant::now());
        Ok(Submission::from_enqueued(enqueued))
    }

    /// Replaces the pending reorder intent. `raw` should already be reconciled
    /// against any filtered view; selected ids it leaves out keep their
    /// relative order behind it when applied.
    pub fn submit_reorder(&self, raw: &[i64]) -> Result<usize, ValidationError> {
        let order = validate_order(raw)?;
        let len = order.len();
        self.queues.lock().reorder(order, Instant::now());
        debug!(len, "reorder intent replaced");
        Ok(len)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queues.lock().stats()
    }

    pub async fn list_available(&self, query: &PageQuery) -> ItemsPage {
        let (offset, limit) = (query.offset(), query.limit());
        let items = self
            .store
            .list_available(query.filter(), offset, limit)
            .await;
        ItemsPage {
            items,
            offset,
            limit,
        }
    }

    pub async fn list_selected(&self, query: &PageQuery) -> ItemsPage {
        let (offset, limit) = (query.offset(), query.limit());
        let items = self.store.list_selected(query.filter(), offset, limit).await;
        ItemsPage {
            items,
            offset,
            limit,
        }
    }

    /// Applies every entry of `kind` whose window has closed.
    pub async fn flush_due(&self, kind: OperationKind) -> FlushReport {
        let batch = self.queues.lock().take_due(kind, Instant::now());
        self.apply(kind, batch).await
    }

    /// Applies everything pending, due or not. Used on shutdown.
    pub async fn drain_all(&self) -> Vec<FlushReport> {
        let mut reports = Vec::with_capacity(OperationKind::ALL.len());
        for kind in OperationKind::ALL {
            let batch = self.queues.lock().drain(kind);
            reports.push(self.apply(kind, batch).await);
        }
        reports
    }

    /// Starts one recurring flush per operation kind, each at its own interval.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        OperationKind::ALL
            .into_iter()
            .map(|kind| {
                let pipeline = Arc::clone(self);
                spawn_flush_loop(
                    kind.as_str(),
                    self.schedule.interval(kind),
                    shutdown.clone(),
                    move || {
                        let pipeline = Arc::clone(&pipeline);
                        async move {
                            pipeline.flush_due(kind).await;
                        }
                    },
                )
            })
            .collect()
    }

    async fn apply(&self, kind: OperationKind, batch: Vec<(String, Mutation)>) -> FlushReport {
        let mut report = FlushReport::empty(kind);
        if batch.is_empty() {
            return report;
        }

        let mut store = self.store.write().await;
        for (key, mutation) in batch {
            match apply_mutation(&mut store, &mutation) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    report.rejected += 1;
                    warn!(%kind, %key, %error, "mutation rejected at flush");
                }
            }
        }
        drop(store);

        info!(
            %kind,
            applied = report.applied,
            rejected = report.rejected,
            "batch flushed"
        );
        report
    }
}

fn apply_mutation(store: &mut ItemStore, mutation: &Mutation) -> Result<(), StoreError> {
    match mutation {
        Mutation::AddItem(id) => store.insert(*id),
        Mutation::Select(id) => store.select(*id),
        Mutation::Deselect(id) => store.deselect(*id),
        Mutation::Reorder(order) => store.reorder(order),
    }
}

fn ensure_positive(id: ItemId) -> Result<(), ValidationError> {
    if id.0 == 0 {
        return Err(ValidationError::NotPositive(0));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
