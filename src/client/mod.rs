//! Client side of the backlog: transport plus a reconciling local cache

use async_trait::async_trait;

use crate::domain::{BacklogItem, BacklogItemUpdate, Category, ItemId, NewBacklogItem};

pub mod cache;
pub mod error;
pub mod http;
pub mod view;

pub use cache::BacklogCache;
pub use error::{ClientError, ClientResult};
pub use http::HttpBacklogApi;

/// Remote operations the cache depends on
#[async_trait]
pub trait BacklogApi: Send + Sync + 'static {
    /// All items of the caller, in server listing order
    async fn fetch_all(&self) -> ClientResult<Vec<BacklogItem>>;

    async fn create(&self, item: &NewBacklogItem) -> ClientResult<BacklogItem>;

    async fn update(&self, id: &ItemId, update: &BacklogItemUpdate) -> ClientResult<BacklogItem>;

    async fn complete(&self, id: &ItemId) -> ClientResult<BacklogItem>;

    async fn uncomplete(&self, id: &ItemId) -> ClientResult<BacklogItem>;

    async fn delete(&self, id: &ItemId) -> ClientResult<()>;

    /// Submits a manual order for one category
    async fn reorder(&self, category: Category, ordered_ids: &[ItemId]) -> ClientResult<()>;
}
