//! Authoritative in-memory store of the id space and the user's ordered selection.

use std::{collections::HashSet, sync::Arc};

use indexmap::IndexSet;
use shared::{domain::ItemId, reorder::IdFilter};
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const DEFAULT_INITIAL_SIZE: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("id {0} already exists")]
    AlreadyExists(ItemId),
    #[error("id {0} does not exist")]
    NotFound(ItemId),
    #[error("id {0} is already selected")]
    AlreadySelected(ItemId),
    #[error("id {0} is not selected")]
    NotSelected(ItemId),
    #[error("order lists id {0} more than once")]
    DuplicateInOrder(ItemId),
}

/// Every id that exists: the seeded range `1..=seeded` followed by ids inserted later.
#[derive(Debug, Clone, Default)]
struct Membership {
    seeded: u64,
    inserted: IndexSet<ItemId>,
}

impl Membership {
    fn contains(&self, id: ItemId) -> bool {
        (1..=self.seeded).contains(&id.0) || self.inserted.contains(&id)
    }

    fn len(&self) -> usize {
        usize::try_from(self.seeded)
            .unwrap_or(usize::MAX)
            .saturating_add(self.inserted.len())
    }

    fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        (1..=self.seeded)
            .map(ItemId)
            .chain(self.inserted.iter().copied())
    }
}

/// Owns the membership set, the selected set and the selected order.
///
/// The selected set and its order live in one insertion-ordered set, so the
/// order can never hold an id twice or miss a selected one.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    membership: Membership,
    selected: IndexSet<ItemId>,
}

impl ItemStore {
    /// Seeds membership with `1..=initial_size`; nothing is selected.
    pub fn new(initial_size: u64) -> Self {
        Self {
            membership: Membership {
                seeded: initial_size,
                inserted: IndexSet::new(),
            },
            selected: IndexSet::new(),
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.membership.contains(id)
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn membership_len(&self) -> usize {
        self.membership.len()
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    pub fn selected_order(&self) -> Vec<ItemId> {
        self.selected.iter().copied().collect()
    }

    pub fn insert(&mut self, id: ItemId) -> Result<(), StoreError> {
        if self.membership.contains(id) {
            return Err(StoreError::AlreadyExists(id));
        }
        self.membership.inserted.insert(id);
        Ok(())
    }

    /// Appends `id` to the tail of the selected order.
    pub fn select(&mut self, id: ItemId) -> Result<(), StoreError> {
        if !self.membership.contains(id) {
            return Err(StoreError::NotFound(id));
        }
        if !self.selected.insert(id) {
            return Err(StoreError::AlreadySelected(id));
        }
        Ok(())
    }

    pub fn deselect(&mut self, id: ItemId) -> Result<(), StoreError> {
        if !self.selected.shift_remove(&id) {
            return Err(StoreError::NotSelected(id));
        }
        Ok(())
    }

    /// Installs `new_order` at the head of the selected order. Selected ids it
    /// does not name follow in their previous relative order. Every named id
    /// must be selected and appear once; on any violation nothing changes.
    pub fn reorder(&mut self, new_order: &[ItemId]) -> Result<(), StoreError> {
        if new_order.is_empty() {
            return Ok(());
        }

        let mut named = HashSet::with_capacity(new_order.len());
        for id in new_order {
            if !named.insert(*id) {
                return Err(StoreError::DuplicateInOrder(*id));
            }
            if !self.selected.contains(id) {
                return Err(StoreError::NotSelected(*id));
            }
        }

        let mut reordered = IndexSet::with_capacity(self.selected.len());
        reordered.extend(new_order.iter().copied());
        reordered.extend(self.selected.iter().copied().filter(|id| !named.contains(id)));
        self.selected = reordered;
        Ok(())
    }

    /// Unselected members whose decimal form contains `filter`, in membership order.
    pub fn list_available(&self, filter: &str, offset: usize, limit: usize) -> Vec<ItemId> {
        let filter = IdFilter::new(filter);
        self.membership
            .iter()
            .filter(|id| !self.selected.contains(id))
            .filter(|id| filter.matches(*id))
            .skip(offset)
            .take(limit)
            .collect()
    }

    /// Selected ids whose decimal form contains `filter`, in selected order.
    pub fn list_selected(&self, filter: &str, offset: usize, limit: usize) -> Vec<ItemId> {
        let filter = IdFilter::new(filter);
        self.selected
            .iter()
            .copied()
            .filter(|id| filter.matches(*id))
            .skip(offset)
            .take(limit)
            .collect()
    }

    /// Checks that every selected id is a member. The order/set bijection is
    /// structural and needs no check.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        match self.selected.iter().find(|id| !self.membership.contains(**id)) {
            Some(id) => Err(StoreError::NotFound(*id)),
            None => Ok(()),
        }
    }
}

/// Cloneable handle to one [`ItemStore`]. Readers share the lock; a flush holds
/// the write guard for its whole batch.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<ItemStore>>,
}

impl SharedStore {
    pub fn new(store: ItemStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn seeded(initial_size: u64) -> Self {
        Self::new(ItemStore::new(initial_size))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ItemStore> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, ItemStore> {
        self.inner.write().await
    }

    pub async fn list_available(&self, filter: &str, offset: usize, limit: usize) -> Vec<ItemId> {
        self.inner.read().await.list_available(filter, offset, limit)
    }

    pub async fn list_selected(&self, filter: &str, offset: usize, limit: usize) -> Vec<ItemId> {
        self.inner.read().await.list_selected(filter, offset, limit)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::seeded(DEFAULT_INITIAL_SIZE)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
