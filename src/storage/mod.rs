use crate::{
    domain::{BacklogItem, Category, ItemFilter, ItemId, NewBacklogItem, OwnerId, SortAssignment},
    error::Result,
};
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;

#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Storage trait for persisting backlog items
///
/// Every item operation takes the owner and filters by it: an item owned by
/// someone else behaves exactly like a missing one.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Inserts a new item at the end of its category.
    ///
    /// The partition max and the insert see the same snapshot.
    async fn insert_item(&self, owner: &OwnerId, data: NewBacklogItem) -> Result<BacklogItem>;

    /// Loads an item by ID
    async fn load_item(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem>;

    /// Lists the owner's items matching `filter`, in canonical listing order
    async fn list_items(&self, owner: &OwnerId, filter: &ItemFilter) -> Result<Vec<BacklogItem>>;

    /// Replaces an existing item
    async fn save_item(&self, owner: &OwnerId, item: &BacklogItem) -> Result<()>;

    /// Deletes an item
    async fn delete_item(&self, owner: &OwnerId, id: &ItemId) -> Result<()>;

    /// Returns the subset of `ids` that are owned, in `category` and not completed
    async fn find_reorderable(
        &self,
        owner: &OwnerId,
        category: Category,
        ids: &[ItemId],
    ) -> Result<Vec<ItemId>>;

    /// Highest position among the owner's incomplete items in `category`
    async fn max_sort_order(&self, owner: &OwnerId, category: Category) -> Result<Option<i64>>;

    /// Writes every assignment or none of them
    async fn apply_sort_orders(
        &self,
        owner: &OwnerId,
        assignments: &[SortAssignment],
    ) -> Result<()>;
}
