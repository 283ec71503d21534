//! Manual ordering rules for a category partition.
//!
//! A partition is the set of incomplete items sharing an owner and a
//! category. Positions are only compared inside one partition.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::item::{BacklogItem, ItemId};

/// New position for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortAssignment {
    pub id: ItemId,
    pub sort_order: i64,
}

/// Position for an item appended to a partition whose highest position is `current_max`.
///
/// An empty partition counts as a max of 0, so the first item lands at 1.
pub fn next_sort_order(current_max: Option<i64>) -> i64 {
    current_max.unwrap_or(0) + 1
}

/// Highest position held in a partition
pub fn partition_max<'a>(items: impl IntoIterator<Item = &'a BacklogItem>) -> Option<i64> {
    items.into_iter().filter_map(|item| item.sort_order).max()
}

/// Turns a requested order into position writes.
///
/// Ids outside `valid` are dropped and the caller's relative order is kept for
/// the rest. Positions are the 0-based index in the filtered sequence. A
/// repeated id keeps only its last position.
pub fn plan_reorder(ordered_ids: &[ItemId], valid: &HashSet<ItemId>) -> Vec<SortAssignment> {
    let filtered: Vec<ItemId> = ordered_ids
        .iter()
        .filter(|id| valid.contains(id))
        .copied()
        .collect();

    let mut last_index: HashMap<ItemId, i64> = HashMap::with_capacity(filtered.len());
    for (index, id) in filtered.iter().enumerate() {
        last_index.insert(*id, index as i64);
    }

    let mut assignments: Vec<SortAssignment> = last_index
        .into_iter()
        .map(|(id, sort_order)| SortAssignment { id, sort_order })
        .collect();
    assignments.sort_by_key(|a| a.sort_order);
    assignments
}

/// Moves `dragged` to the slot currently held by `target` in an ordered partition.
///
/// Returns `None` when either id is missing, leaving `partition` untouched.
pub fn move_within(
    partition: &mut Vec<BacklogItem>,
    dragged: ItemId,
    target: ItemId,
) -> Option<()> {
    let from = partition.iter().position(|item| item.id == dragged)?;
    let to = partition.iter().position(|item| item.id == target)?;

    let item = partition.remove(from);
    partition.insert(to, item);
    Some(())
}
