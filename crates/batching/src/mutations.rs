use shared::{
    domain::{ItemId, OperationKind},
    protocol::QueueStats,
};
use tokio::time::Instant;

use crate::{queue::BatchQueue, schedule::FlushSchedule};

/// The single key every reorder intent is stored under.
pub const REORDER_KEY: &str = "reorder";

/// Dedup key for an id-scoped operation. Reorder uses [`REORDER_KEY`].
pub fn dedup_key(kind: OperationKind, id: ItemId) -> String {
    match kind {
        OperationKind::AddItem => id.to_string(),
        OperationKind::Select => format!("select:{id}"),
        OperationKind::Deselect => format!("deselect:{id}"),
        OperationKind::Reorder => REORDER_KEY.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddItem(ItemId),
    Select(ItemId),
    Deselect(ItemId),
    Reorder(Vec<ItemId>),
}

impl Mutation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Mutation::AddItem(_) => OperationKind::AddItem,
            Mutation::Select(_) => OperationKind::Select,
            Mutation::Deselect(_) => OperationKind::Deselect,
            Mutation::Reorder(_) => OperationKind::Reorder,
        }
    }
}

/// One queue per operation kind.
#[derive(Debug)]
pub struct MutationQueues {
    add_item: BatchQueue<ItemId>,
    select: BatchQueue<ItemId>,
    deselect: BatchQueue<ItemId>,
    reorder: BatchQueue<Vec<ItemId>>,
}

impl MutationQueues {
    pub fn new(schedule: FlushSchedule) -> Self {
        Self {
            add_item: BatchQueue::new("add_item", schedule.interval(OperationKind::AddItem)),
            select: BatchQueue::new("select", schedule.interval(OperationKind::Select)),
            deselect: BatchQueue::new("deselect", schedule.interval(OperationKind::Deselect)),
            reorder: BatchQueue::new("reorder", schedule.interval(OperationKind::Reorder)),
        }
    }

    pub fn add_item(&mut self, id: ItemId, now: Instant) -> bool {
        self.add_item
            .enqueue(dedup_key(OperationKind::AddItem, id), id, now)
    }

    /// Queues a select after dropping any pending deselect of the same id.
    pub fn select(&mut self, id: ItemId, now: Instant) -> bool {
        self.deselect.cancel(&dedup_key(OperationKind::Deselect, id));
        self.select
            .enqueue(dedup_key(OperationKind::Select, id), id, now)
    }

    /// Queues a deselect after dropping any pending select of the same id.
    pub fn deselect(&mut self, id: ItemId, now: Instant) -> bool {
        self.select.cancel(&dedup_key(OperationKind::Select, id));
        self.deselect
            .enqueue(dedup_key(OperationKind::Deselect, id), id, now)
    }

    /// Only the latest order matters; earlier intents are never replayed.
    pub fn reorder(&mut self, order: Vec<ItemId>, now: Instant) {
        self.reorder.overwrite(REORDER_KEY, order, now);
    }

    pub fn take_due(&mut self, kind: OperationKind, now: Instant) -> Vec<(String, Mutation)> {
        match kind {
            OperationKind::AddItem => tag(self.add_item.take_due(now), Mutation::AddItem),
            OperationKind::Select => tag(self.select.take_due(now), Mutation::Select),
            OperationKind::Deselect => tag(self.deselect.take_due(now), Mutation::Deselect),
            OperationKind::Reorder => tag(self.reorder.take_due(now), Mutation::Reorder),
        }
    }

    pub fn drain(&mut self, kind: OperationKind) -> Vec<(String, Mutation)> {
        match kind {
            OperationKind::AddItem => tag(self.add_item.drain(), Mutation::AddItem),
            OperationKind::Select => tag(self.select.drain(), Mutation::Select),
            OperationKind::Deselect => tag(self.deselect.drain(), Mutation::Deselect),
            OperationKind::Reorder => tag(self.reorder.drain(), Mutation::Reorder),
        }
    }

    pub fn pending(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::AddItem => self.add_item.len(),
            OperationKind::Select => self.select.len(),
            OperationKind::Deselect => self.deselect.len(),
            OperationKind::Reorder => self.reorder.len(),
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            add_item: self.add_item.len(),
            select: self.select.len(),
            deselect: self.deselect.len(),
            reorder: self.reorder.len(),
        }
    }
}

fn tag<P>(entries: Vec<(String, P)>, wrap: fn(P) -> Mutation) -> Vec<(String, Mutation)> {
    entries
        .into_iter()
        .map(|(key, payload)| (key, wrap(payload)))
        .collect()
}

#[cfg(test)]
#[path = "tests/mutations_tests.rs"]
mod tests;
