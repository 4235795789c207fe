//! Deduplicating, time-windowed batching of mutation requests.
//!
//! Each operation kind gets its own [`BatchQueue`] with its own flush interval.
//! [`MutationQueues`] bundles the four kinds and applies the rule that a
//! select and a deselect of the same id cancel each other while pending.

mod mutations;
mod queue;
mod schedule;

pub use mutations::{dedup_key, Mutation, MutationQueues, REORDER_KEY};
pub use queue::BatchQueue;
pub use schedule::{spawn_flush_loop, FlushSchedule};
