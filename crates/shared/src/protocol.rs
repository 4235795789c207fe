use serde::{Deserialize, Serialize};

use crate::{
    domain::{ItemId, OperationKind},
    error::ValidationError,
};

pub const PAGE_LIMIT_MAX: usize = 20;

pub fn items_route() -> &'static str {
    "/api/items"
}

pub fn selected_route() -> &'static str {
    "/api/selected"
}

pub fn reorder_route() -> &'static str {
    "/api/selected/reorder"
}

pub fn queue_route() -> &'static str {
    "/api/queue"
}

pub fn selected_item_route(id: ItemId) -> String {
    format!("{}/{}", selected_route(), id)
}

/// Query string of both listing routes. Values are kept as text so that
/// garbage falls back to the default instead of failing the request: `offset`
/// defaults to 0 and never goes negative, `limit` defaults to 20 when missing,
/// zero or unparseable, and is otherwise clamped to `1..=20`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn new(filter: impl Into<String>, offset: usize, limit: usize) -> Self {
        Self {
            filter: Some(filter.into()),
            offset: Some(offset.to_string()),
            limit: Some(limit.to_string()),
        }
    }

    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or_default()
    }

    pub fn offset(&self) -> usize {
        match parse_int(self.offset.as_deref()) {
            Some(offset) if offset > 0 => usize::try_from(offset).unwrap_or(usize::MAX),
            _ => 0,
        }
    }

    pub fn limit(&self) -> usize {
        match parse_int(self.limit.as_deref()) {
            None | Some(0) => PAGE_LIMIT_MAX,
            Some(limit) if limit < 0 => 1,
            Some(limit) => usize::try_from(limit)
                .unwrap_or(usize::MAX)
                .min(PAGE_LIMIT_MAX),
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsPage {
    pub items: Vec<ItemId>,
    pub offset: usize,
    pub limit: usize,
}

/// An id as it arrives in a JSON body: either a number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawItemId {
    Number(i64),
    Text(String),
}

impl RawItemId {
    pub fn parse(&self) -> Result<ItemId, ValidationError> {
        match self {
            RawItemId::Number(value) => ItemId::from_i64(*value),
            RawItemId::Text(value) => ItemId::parse(value),
        }
    }
}

impl From<ItemId> for RawItemId {
    fn from(value: ItemId) -> Self {
        RawItemId::Number(value.0 as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub id: RawItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<i64>,
}

impl ReorderRequest {
    pub fn from_order(order: &[ItemId]) -> Self {
        Self {
            order: order.iter().map(|id| id.0 as i64).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub kind: OperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub add_item: usize,
    pub select: usize,
    pub deselect: usize,
    pub reorder: usize,
}

impl QueueStats {
    pub fn total(&self) -> usize {
        self.add_item + self.select + self.deselect + self.reorder
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
