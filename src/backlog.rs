//! Backlog service: the ordering engine over a [`Storage`] backend.
//!
//! Every call takes the owner explicitly and hands it to the store, so no
//! operation can reach another user's items.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    domain::{
        plan_reorder, BacklogItem, BacklogItemUpdate, Category, ItemFilter, ItemId,
        NewBacklogItem, OwnerId,
    },
    error::Result,
    storage::Storage,
};

/// Outcome of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Ids that received a new position
    pub applied: usize,
    /// Ids dropped because they were missing, foreign, in another category or completed
    pub dropped: usize,
}

#[derive(Clone)]
pub struct Backlog {
    storage: Arc<dyn Storage>,
}

impl Backlog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Lists items in canonical order
    pub async fn list(&self, owner: &OwnerId, filter: &ItemFilter) -> Result<Vec<BacklogItem>> {
        let items = self.storage.list_items(owner, filter).await?;
        debug!(owner = %owner, count = items.len(), "listed backlog items");
        Ok(items)
    }

    pub async fn get(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem> {
        self.storage.load_item(owner, id).await
    }

    /// Creates an item at the end of its category
    pub async fn create(&self, owner: &OwnerId, data: NewBacklogItem) -> Result<BacklogItem> {
        data.validate()?;
        let item = self.storage.insert_item(owner, data).await?;
        info!(
            owner = %owner,
            id = %item.id,
            category = %item.category,
            sort_order = ?item.sort_order,
            "created backlog item"
        );
        Ok(item)
    }

    pub async fn update(
        &self,
        owner: &OwnerId,
        id: &ItemId,
        update: BacklogItemUpdate,
    ) -> Result<BacklogItem> {
        update.validate()?;
        let mut item = self.storage.load_item(owner, id).await?;
        update.apply_to(&mut item);
        self.storage.save_item(owner, &item).await?;
        info!(owner = %owner, id = %id, "updated backlog item");
        Ok(item)
    }

    /// Marks an item completed. Its position is kept but no longer used for display.
    pub async fn complete(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem> {
        let mut item = self.storage.load_item(owner, id).await?;
        item.complete();
        self.storage.save_item(owner, &item).await?;
        info!(owner = %owner, id = %id, "completed backlog item");
        Ok(item)
    }

    /// Reopens an item; it resumes its previous position
    pub async fn uncomplete(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem> {
        let mut item = self.storage.load_item(owner, id).await?;
        item.uncomplete();
        self.storage.save_item(owner, &item).await?;
        info!(owner = %owner, id = %id, "reopened backlog item");
        Ok(item)
    }

    pub async fn delete(&self, owner: &OwnerId, id: &ItemId) -> Result<()> {
        self.storage.delete_item(owner, id).await?;
        info!(owner = %owner, id = %id, "deleted backlog item");
        Ok(())
    }

    /// Applies a manual order to one category.
    ///
    /// Ids that are unknown, foreign, in another category or completed are
    /// dropped without error. The rest get positions `0..n` in the order given
    /// and are written in a single all-or-nothing batch. Items of the
    /// partition that were not named keep their current positions.
    pub async fn reorder(
        &self,
        owner: &OwnerId,
        category: Category,
        ordered_ids: &[ItemId],
    ) -> Result<ReorderOutcome> {
        let valid: HashSet<ItemId> = self
            .storage
            .find_reorderable(owner, category, ordered_ids)
            .await?
            .into_iter()
            .collect();

        let assignments = plan_reorder(ordered_ids, &valid);
        let dropped = ordered_ids.iter().filter(|id| !valid.contains(id)).count();
        if dropped > 0 {
            warn!(
                owner = %owner,
                category = %category,
                dropped,
                "ignoring ids outside the partition"
            );
        }

        if assignments.is_empty() {
            debug!(owner = %owner, category = %category, "nothing to reorder");
            return Ok(ReorderOutcome { applied: 0, dropped });
        }

        self.storage.apply_sort_orders(owner, &assignments).await?;
        info!(
            owner = %owner,
            category = %category,
            applied = assignments.len(),
            "reordered backlog category"
        );

        Ok(ReorderOutcome {
            applied: assignments.len(),
            dropped,
        })
    }
}
