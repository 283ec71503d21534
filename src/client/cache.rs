//! Local copy of the backlog with optimistic reordering.
//!
//! The cache only ever holds one of two things: the last authoritative list
//! fetched from the server, or that list with a local drag applied on top.
//! Every settled write is followed by a fresh fetch that replaces the list
//! wholesale.

use chrono::{Local, Utc};
use parking_lot::RwLock;
use std::{collections::HashSet, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{view, BacklogApi, ClientResult};
use crate::domain::{
    ordering::move_within, BacklogItem, BacklogItemUpdate, Category, ItemId, NewBacklogItem,
};

#[derive(Debug, Default)]
struct CacheState {
    items: Vec<BacklogItem>,
    /// Reorders submitted but not yet reconciled
    pending: usize,
    /// Fetch tickets handed out
    issued: u64,
    /// Newest ticket whose result is in `items`
    applied: u64,
}

/// Fetches the list and installs it unless a newer fetch already landed
async fn refresh_into<A: BacklogApi + ?Sized>(
    api: &A,
    state: &RwLock<CacheState>,
) -> ClientResult<()> {
    let ticket = {
        let mut state = state.write();
        state.issued += 1;
        state.issued
    };

    let items = api.fetch_all().await?;

    let mut state = state.write();
    if ticket > state.applied {
        state.items = items;
        state.applied = ticket;
    } else {
        debug!(ticket, applied = state.applied, "discarding stale fetch");
    }
    Ok(())
}

pub struct BacklogCache<A> {
    api: Arc<A>,
    state: Arc<RwLock<CacheState>>,
}

impl<A> Clone for BacklogCache<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: BacklogApi> BacklogCache<A> {
    /// Creates an empty cache; call [`refresh`](Self::refresh) to load it
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Replaces the cached list with the server's
    pub async fn refresh(&self) -> ClientResult<()> {
        refresh_into(self.api.as_ref(), &self.state).await
    }

    /// Raw cached list, without display processing
    pub fn snapshot(&self) -> Vec<BacklogItem> {
        self.state.read().items.clone()
    }

    /// Whether a reorder is still waiting for reconciliation
    pub fn is_pending(&self) -> bool {
        self.state.read().pending > 0
    }

    /// Cached items as displayed, with overdue items shown as completed
    pub fn items(&self) -> Vec<BacklogItem> {
        let items = self.snapshot();
        view::process_overdue(&items, Local::now().date_naive(), Utc::now())
    }

    pub fn items_by_category(&self, category: Category) -> Vec<BacklogItem> {
        view::by_category(&self.items(), category)
    }

    pub fn completed_items(&self) -> Vec<BacklogItem> {
        view::completed(&self.items())
    }

    pub async fn add_item(&self, item: NewBacklogItem) -> ClientResult<BacklogItem> {
        let created = self.api.create(&item).await?;
        self.refresh().await?;
        Ok(created)
    }

    pub async fn update_item(
        &self,
        id: ItemId,
        update: BacklogItemUpdate,
    ) -> ClientResult<BacklogItem> {
        let updated = self.api.update(&id, &update).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete_item(&self, id: ItemId) -> ClientResult<()> {
        self.api.delete(&id).await?;
        self.refresh().await
    }

    pub async fn complete_item(&self, id: ItemId) -> ClientResult<BacklogItem> {
        let item = self.api.complete(&id).await?;
        self.refresh().await?;
        Ok(item)
    }

    pub async fn uncomplete_item(&self, id: ItemId) -> ClientResult<BacklogItem> {
        let item = self.api.uncomplete(&id).await?;
        self.refresh().await?;
        Ok(item)
    }

    /// Moves `dragged` into the slot of `target` within `category`.
    ///
    /// The cached list changes before this returns. The new order is then
    /// submitted in a background task that refetches the list whether the
    /// submit succeeded or not; the returned handle resolves once that
    /// refetch is done. Returns `None`, without touching the cache or the
    /// server, when either id is not in the displayed partition.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn reorder_items(
        &self,
        category: Category,
        dragged: ItemId,
        target: ItemId,
    ) -> Option<JoinHandle<()>> {
        let today = Local::now().date_naive();

        let ordered_ids = {
            let mut state = self.state.write();

            let mut partition: Vec<BacklogItem> = state
                .items
                .iter()
                .filter(|item| {
                    item.category == category
                        && !item.is_completed()
                        && !view::is_overdue(item, today)
                })
                .cloned()
                .collect();

            move_within(&mut partition, dragged, target)?;

            for (index, item) in partition.iter_mut().enumerate() {
                item.sort_order = Some(index as i64);
            }

            let ids: Vec<ItemId> = partition.iter().map(|item| item.id).collect();
            let moved: HashSet<ItemId> = ids.iter().copied().collect();

            let mut next: Vec<BacklogItem> = state
                .items
                .iter()
                .filter(|item| !moved.contains(&item.id))
                .cloned()
                .collect();
            next.extend(partition);

            state.items = next;
            state.pending += 1;
            // Fetches already in flight predate the drag
            state.applied = state.issued;
            ids
        };

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);

        Some(tokio::spawn(async move {
            if let Err(e) = api.reorder(category, &ordered_ids).await {
                warn!(
                    category = %category,
                    error = %e,
                    "reorder rejected, reverting to server order"
                );
            }
            if let Err(e) = refresh_into(api.as_ref(), &state).await {
                warn!(error = %e, "refetch after reorder failed");
            }

            let mut state = state.write();
            state.pending = state.pending.saturating_sub(1);
        }))
    }
}

#[cfg(all(test, feature = "file-storage"))]
mod tests {
    use super::*;
    use crate::backlog::Backlog;
    use crate::client::ClientError;
    use crate::domain::{ItemFilter, OwnerId, Priority};
    use crate::storage::{FileStorage, Storage};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-process server: the real engine behind the client trait
    struct LocalApi {
        backlog: Backlog,
        owner: OwnerId,
        fail_reorder: AtomicBool,
        reorder_calls: AtomicUsize,
        _dir: TempDir,
    }

    impl LocalApi {
        async fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let storage = FileStorage::new(dir.path());
            storage.initialize().await.unwrap();
            Self {
                backlog: Backlog::new(Arc::new(storage)),
                owner: OwnerId::new("alice").unwrap(),
                fail_reorder: AtomicBool::new(false),
                reorder_calls: AtomicUsize::new(0),
                _dir: dir,
            }
        }
    }

    fn server_error(e: crate::error::BacklogError) -> ClientError {
        ClientError::Server(e.to_string())
    }

    #[async_trait]
    impl BacklogApi for LocalApi {
        async fn fetch_all(&self) -> ClientResult<Vec<BacklogItem>> {
            self.backlog
                .list(&self.owner, &ItemFilter::default())
                .await
                .map_err(server_error)
        }

        async fn create(&self, item: &NewBacklogItem) -> ClientResult<BacklogItem> {
            self.backlog.create(&self.owner, item.clone()).await.map_err(server_error)
        }

        async fn update(
            &self,
            id: &ItemId,
            update: &BacklogItemUpdate,
        ) -> ClientResult<BacklogItem> {
            self.backlog
                .update(&self.owner, id, update.clone())
                .await
                .map_err(server_error)
        }

        async fn complete(&self, id: &ItemId) -> ClientResult<BacklogItem> {
            self.backlog.complete(&self.owner, id).await.map_err(server_error)
        }

        async fn uncomplete(&self, id: &ItemId) -> ClientResult<BacklogItem> {
            self.backlog.uncomplete(&self.owner, id).await.map_err(server_error)
        }

        async fn delete(&self, id: &ItemId) -> ClientResult<()> {
            self.backlog.delete(&self.owner, id).await.map_err(server_error)
        }

        async fn reorder(&self, category: Category, ordered_ids: &[ItemId]) -> ClientResult<()> {
            self.reorder_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reorder.load(Ordering::SeqCst) {
                return Err(ClientError::Server("storage unavailable".to_string()));
            }
            self.backlog
                .reorder(&self.owner, category, ordered_ids)
                .await
                .map(|_| ())
                .map_err(server_error)
        }
    }

    fn new_item(title: &str, category: Category, start: NaiveDate) -> NewBacklogItem {
        NewBacklogItem::new(title, category, Priority::Medium, start)
    }

    fn far_future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2999, 1, 1).unwrap()
    }

    fn titles(items: &[BacklogItem]) -> Vec<String> {
        items.iter().map(|i| i.title.clone()).collect()
    }

    async fn seeded_cache() -> (BacklogCache<LocalApi>, Vec<BacklogItem>) {
        let cache = BacklogCache::new(LocalApi::new().await);
        let mut created = Vec::new();
        for title in ["a", "b", "c"] {
            let item = new_item(title, Category::Books, far_future());
            created.push(cache.add_item(item).await.unwrap());
        }
        cache
            .add_item(new_item("u", Category::Udemy, far_future()))
            .await
            .unwrap();
        (cache, created)
    }

    #[tokio::test]
    async fn test_reorder_applies_locally_then_converges() {
        let (cache, created) = seeded_cache().await;
        let (a, c) = (created[0].id, created[2].id);

        let handle = cache.reorder_items(Category::Books, c, a).unwrap();

        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["c", "a", "b"]);
        assert!(cache.is_pending());

        handle.await.unwrap();

        assert!(!cache.is_pending());
        let server = cache.api().fetch_all().await.unwrap();
        assert_eq!(cache.snapshot(), server);
        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["c", "a", "b"]);
        assert_eq!(titles(&cache.items_by_category(Category::Udemy)), vec!["u"]);
    }

    #[tokio::test]
    async fn test_failed_reorder_reverts_to_server_order() {
        let (cache, created) = seeded_cache().await;
        cache.api().fail_reorder.store(true, Ordering::SeqCst);

        let handle = cache
            .reorder_items(Category::Books, created[2].id, created[0].id)
            .unwrap();
        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["c", "a", "b"]);

        handle.await.unwrap();

        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["a", "b", "c"]);
        assert_eq!(cache.snapshot(), cache.api().fetch_all().await.unwrap());
        assert_eq!(cache.api().reorder_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reorder_with_unknown_ids_is_noop() {
        let (cache, created) = seeded_cache().await;
        let before = cache.snapshot();

        assert!(cache
            .reorder_items(Category::Books, ItemId::new(), created[0].id)
            .is_none());
        // Item from another category is not in the Books partition
        let udemy = cache.items_by_category(Category::Udemy)[0].id;
        assert!(cache
            .reorder_items(Category::Books, udemy, created[0].id)
            .is_none());

        assert_eq!(cache.snapshot(), before);
        assert!(!cache.is_pending());
        assert_eq!(cache.api().reorder_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlapping_reorders_converge() {
        let (cache, created) = seeded_cache().await;
        let (a, b, c) = (created[0].id, created[1].id, created[2].id);

        let first = cache.reorder_items(Category::Books, c, a).unwrap();
        let second = cache.reorder_items(Category::Books, b, c).unwrap();
        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["b", "c", "a"]);

        first.await.unwrap();
        second.await.unwrap();

        assert!(!cache.is_pending());
        assert_eq!(cache.snapshot(), cache.api().fetch_all().await.unwrap());
    }

    #[tokio::test]
    async fn test_overdue_items_display_as_completed() {
        let cache = BacklogCache::new(LocalApi::new().await);
        let past = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let stale = cache
            .add_item(new_item("stale", Category::Interview, past))
            .await
            .unwrap();
        cache
            .add_item(new_item("fresh", Category::Interview, far_future()))
            .await
            .unwrap();

        assert_eq!(titles(&cache.items_by_category(Category::Interview)), vec!["fresh"]);
        assert_eq!(titles(&cache.completed_items()), vec!["stale"]);

        let server = cache.api().backlog.get(&cache.api().owner, &stale.id).await.unwrap();
        assert!(server.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_mutations_refresh_cache() {
        let (cache, created) = seeded_cache().await;
        let a = created[0].id;

        cache
            .update_item(
                a,
                BacklogItemUpdate {
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cache.snapshot().iter().any(|i| i.title == "renamed"));

        cache.complete_item(a).await.unwrap();
        assert_eq!(titles(&cache.completed_items()), vec!["renamed"]);

        cache.uncomplete_item(a).await.unwrap();
        assert!(cache.completed_items().is_empty());

        cache.delete_item(a).await.unwrap();
        assert_eq!(titles(&cache.items_by_category(Category::Books)), vec!["b", "c"]);
    }
}
