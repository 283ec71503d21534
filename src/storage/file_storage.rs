use crate::{
    domain::{
        ordering::{next_sort_order, partition_max},
        sort_items, BacklogItem, Category, ItemFilter, ItemId, NewBacklogItem, OwnerId,
        SortAssignment,
    },
    error::{BacklogError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use tracing::debug;

/// All items of one owner, stored as a single JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
struct OwnerDocument {
    items: Vec<BacklogItem>,
}

/// File-based storage implementation
///
/// Each owner gets one document. A mutation rewrites the whole document via a
/// temp file and a rename, so a batch lands completely or not at all.
pub struct FileStorage {
    root_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    const BACKLOG_DIR: &'static str = ".backlog";
    const OWNERS_DIR: &'static str = "owners";

    /// Creates a new FileStorage instance under the given data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root_path: data_dir.as_ref().join(Self::BACKLOG_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn owners_dir(&self) -> PathBuf {
        self.root_path.join(Self::OWNERS_DIR)
    }

    fn owner_file(&self, owner: &OwnerId) -> PathBuf {
        // Hex keeps arbitrary owner strings safe as file names
        let name: String = owner
            .as_str()
            .bytes()
            .map(|b| format!("{:02x}", b))
            .collect();
        self.owners_dir().join(format!("{}.json", name))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_document(&self, owner: &OwnerId) -> Result<OwnerDocument> {
        let file_path = self.owner_file(owner);

        if !file_path.exists() {
            return Ok(OwnerDocument::default());
        }

        let contents = fs::read_to_string(&file_path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_document(&self, owner: &OwnerId, document: &OwnerDocument) -> Result<()> {
        self.ensure_directory_exists(&self.owners_dir()).await?;

        let file_path = self.owner_file(owner);
        let tmp_path = file_path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(document)?;

        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &file_path).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.owners_dir()).await?;
        Ok(())
    }

    async fn insert_item(&self, owner: &OwnerId, data: NewBacklogItem) -> Result<BacklogItem> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document(owner).await?;

        let category = data.category;
        let max = partition_max(
            document
                .items
                .iter()
                .filter(|item| item.in_partition(owner, category)),
        );
        let item = BacklogItem::new(owner.clone(), data, next_sort_order(max));

        document.items.push(item.clone());
        self.write_document(owner, &document).await?;
        Ok(item)
    }

    async fn load_item(&self, owner: &OwnerId, id: &ItemId) -> Result<BacklogItem> {
        self.read_document(owner)
            .await?
            .items
            .into_iter()
            .find(|item| &item.id == id && &item.user_id == owner)
            .ok_or_else(|| BacklogError::ItemNotFound(id.to_string()))
    }

    async fn list_items(&self, owner: &OwnerId, filter: &ItemFilter) -> Result<Vec<BacklogItem>> {
        let mut items: Vec<BacklogItem> = self
            .read_document(owner)
            .await?
            .items
            .into_iter()
            .filter(|item| &item.user_id == owner && filter.matches(item))
            .collect();

        sort_items(&mut items);
        Ok(items)
    }

    async fn save_item(&self, owner: &OwnerId, item: &BacklogItem) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document(owner).await?;

        let slot = document
            .items
            .iter_mut()
            .find(|existing| existing.id == item.id && &existing.user_id == owner)
            .ok_or_else(|| BacklogError::ItemNotFound(item.id.to_string()))?;
        *slot = item.clone();

        self.write_document(owner, &document).await
    }

    async fn delete_item(&self, owner: &OwnerId, id: &ItemId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document(owner).await?;

        let before = document.items.len();
        document.items.retain(|item| &item.id != id);
        if document.items.len() == before {
            return Err(BacklogError::ItemNotFound(id.to_string()));
        }

        self.write_document(owner, &document).await
    }

    async fn find_reorderable(
        &self,
        owner: &OwnerId,
        category: Category,
        ids: &[ItemId],
    ) -> Result<Vec<ItemId>> {
        let document = self.read_document(owner).await?;
        Ok(document
            .items
            .iter()
            .filter(|item| item.in_partition(owner, category) && ids.contains(&item.id))
            .map(|item| item.id)
            .collect())
    }

    async fn max_sort_order(&self, owner: &OwnerId, category: Category) -> Result<Option<i64>> {
        let document = self.read_document(owner).await?;
        Ok(partition_max(
            document
                .items
                .iter()
                .filter(|item| item.in_partition(owner, category)),
        ))
    }

    async fn apply_sort_orders(
        &self,
        owner: &OwnerId,
        assignments: &[SortAssignment],
    ) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document(owner).await?;

        let positions: HashMap<ItemId, i64> = assignments
            .iter()
            .map(|a| (a.id, a.sort_order))
            .collect();
        let mut updated = 0usize;
        for item in document.items.iter_mut() {
            if let Some(position) = positions.get(&item.id) {
                item.sort_order = Some(*position);
                updated += 1;
            }
        }

        debug!(owner = %owner, updated, "writing sort orders");
        self.write_document(owner, &document).await
    }
}
