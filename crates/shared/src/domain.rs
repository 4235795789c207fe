use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A member of the enumerable ID space. Always positive once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn from_i64(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::NotPositive(raw));
        }
        Ok(Self(raw as u64))
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::NotNumeric(trimmed.to_string()))?;
        Self::from_i64(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates a submitted order: every entry positive, no entry twice.
pub fn validate_order(raw: &[i64]) -> Result<Vec<ItemId>, ValidationError> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut order = Vec::with_capacity(raw.len());
    for value in raw {
        let id = ItemId::from_i64(*value)?;
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateInOrder(id));
        }
        order.push(id);
    }
    Ok(order)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AddItem,
    Select,
    Deselect,
    Reorder,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::AddItem,
        OperationKind::Select,
        OperationKind::Deselect,
        OperationKind::Reorder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::AddItem => "add_item",
            OperationKind::Select => "select",
            OperationKind::Deselect => "deselect",
            OperationKind::Reorder => "reorder",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
