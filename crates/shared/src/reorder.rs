//! Mapping a drag performed on a filtered view back onto the full selected order.
//!
//! A filtered view shows only the ids whose decimal form contains the filter
//! text. Dragging reorders that visible subsequence; [`merge_visible`] writes
//! the new visible order back into the slots the visible ids occupied, so ids
//! hidden by the filter never change position.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::ItemId;

/// Substring filter over the decimal form of an id. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdFilter(String);

impl IdFilter {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, id: ItemId) -> bool {
        self.0.is_empty() || id.0.to_string().contains(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("visible order has {actual} ids but the filter shows {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("id {0} is not visible under the active filter")]
    NotVisible(ItemId),
    #[error("id {0} appears more than once in the visible order")]
    Duplicate(ItemId),
}

/// The subsequence of `full` shown under `filter`, in `full`'s order.
pub fn visible_subsequence(full: &[ItemId], filter: &str) -> Vec<ItemId> {
    let filter = IdFilter::new(filter);
    full.iter().copied().filter(|id| filter.matches(*id)).collect()
}

/// Rebuilds `full` so the visible ids follow `new_visible` while hidden ids keep
/// their absolute slots.
///
/// `new_visible` must be a permutation of [`visible_subsequence`]`(full, filter)`;
/// anything else is rejected before a single slot is written.
pub fn merge_visible(
    full: &[ItemId],
    new_visible: &[ItemId],
    filter: &str,
) -> Result<Vec<ItemId>, ReconcileError> {
    let filter = IdFilter::new(filter);
    let slots: Vec<usize> = full
        .iter()
        .enumerate()
        .filter(|(_, id)| filter.matches(**id))
        .map(|(slot, _)| slot)
        .collect();

    if slots.len() != new_visible.len() {
        return Err(ReconcileError::LengthMismatch {
            expected: slots.len(),
            actual: new_visible.len(),
        });
    }

    let visible: HashSet<ItemId> = slots.iter().map(|slot| full[*slot]).collect();
    let mut seen = HashSet::with_capacity(new_visible.len());
    for id in new_visible {
        if !visible.contains(id) {
            return Err(ReconcileError::NotVisible(*id));
        }
        if !seen.insert(*id) {
            return Err(ReconcileError::Duplicate(*id));
        }
    }

    let mut merged = full.to_vec();
    for (slot, id) in slots.into_iter().zip(new_visible) {
        merged[slot] = *id;
    }
    Ok(merged)
}

/// Result of dropping the element at `from` onto position `to`.
/// `None` when either index is out of range.
pub fn move_item(items: &[ItemId], from: usize, to: usize) -> Option<Vec<ItemId>> {
    if from >= items.len() || to >= items.len() {
        return None;
    }
    let mut moved = items.to_vec();
    let id = moved.remove(from);
    moved.insert(to, id);
    Some(moved)
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
