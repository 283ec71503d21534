//! HTTP transport for the backlog API

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{BacklogApi, ClientError, ClientResult};
use crate::api::{ErrorBody, ReorderRequest, OWNER_HEADER};
use crate::domain::{BacklogItem, BacklogItemUpdate, Category, ItemId, NewBacklogItem, OwnerId};

/// Talks to a running backlog server on behalf of one owner
#[derive(Debug, Clone)]
pub struct HttpBacklogApi {
    client: Client,
    base_url: String,
    owner: OwnerId,
}

impl HttpBacklogApi {
    pub fn new(
        base_url: impl Into<String>,
        owner: OwnerId,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            owner,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self.client
            .request(method, url)
            .header(OWNER_HEADER, self.owner.as_str())
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            _ => ClientError::Server(message),
        })
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn empty(request: RequestBuilder) -> ClientResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl BacklogApi for HttpBacklogApi {
    async fn fetch_all(&self) -> ClientResult<Vec<BacklogItem>> {
        Self::json(self.request(Method::GET, "/api/backlog")).await
    }

    async fn create(&self, item: &NewBacklogItem) -> ClientResult<BacklogItem> {
        Self::json(self.request(Method::POST, "/api/backlog").json(item)).await
    }

    async fn update(&self, id: &ItemId, update: &BacklogItemUpdate) -> ClientResult<BacklogItem> {
        let path = format!("/api/backlog/{}", id);
        Self::json(self.request(Method::PUT, &path).json(update)).await
    }

    async fn complete(&self, id: &ItemId) -> ClientResult<BacklogItem> {
        let path = format!("/api/backlog/{}/complete", id);
        Self::json(self.request(Method::POST, &path)).await
    }

    async fn uncomplete(&self, id: &ItemId) -> ClientResult<BacklogItem> {
        let path = format!("/api/backlog/{}/uncomplete", id);
        Self::json(self.request(Method::POST, &path)).await
    }

    async fn delete(&self, id: &ItemId) -> ClientResult<()> {
        let path = format!("/api/backlog/{}", id);
        Self::empty(self.request(Method::DELETE, &path)).await
    }

    async fn reorder(&self, category: Category, ordered_ids: &[ItemId]) -> ClientResult<()> {
        let body = ReorderRequest {
            category,
            ordered_ids: ordered_ids.iter().map(ItemId::to_string).collect(),
        };
        Self::empty(self.request(Method::PUT, "/api/backlog/reorder").json(&body)).await
    }
}
