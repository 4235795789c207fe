use shared::{
    domain::ItemId,
    reorder::{merge_visible, move_item, visible_subsequence, ReconcileError},
};

/// The client's copy of the selected order and the filter it is viewed through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedList {
    items: Vec<ItemId>,
    filter: String,
}

impl SelectedList {
    pub fn new(items: Vec<ItemId>, filter: impl Into<String>) -> Self {
        Self {
            items,
            filter: filter.into(),
        }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn visible(&self) -> Vec<ItemId> {
        visible_subsequence(&self.items, &self.filter)
    }

    /// Appends a freshly loaded page, skipping ids already held.
    pub fn extend_page(&mut self, page: &[ItemId]) {
        for id in page {
            if !self.items.contains(id) {
                self.items.push(*id);
            }
        }
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| *existing != id);
        self.items.len() != before
    }

    /// Drops `active` onto the visible slot of `over`. Hidden ids stay where
    /// they are. Returns the new full order to submit, or `None` when the drag
    /// changes nothing.
    pub fn drag(
        &mut self,
        active: ItemId,
        over: ItemId,
    ) -> Result<Option<Vec<ItemId>>, ReconcileError> {
        if active == over {
            return Ok(None);
        }
        let visible = self.visible();
        let from = visible.iter().position(|id| *id == active);
        let to = visible.iter().position(|id| *id == over);
        let Some(new_visible) = from.zip(to).and_then(|(from, to)| move_item(&visible, from, to))
        else {
            return Ok(None);
        };

        let merged = merge_visible(&self.items, &new_visible, &self.filter)?;
        self.items = merged.clone();
        Ok(Some(merged))
    }
}

#[cfg(test)]
#[path = "tests/selected_list_tests.rs"]
mod tests;
