//! HTTP client for the selection service plus the client-side pieces that run
//! before anything reaches the server: batching of submissions and turning a
//! drag on a filtered list into a full order.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::ItemId,
    error::ApiError,
    protocol::{
        items_route, queue_route, reorder_route, selected_item_route, selected_route,
        AddItemRequest, ItemsPage, PageQuery, QueueStats, QueuedResponse, ReorderRequest,
        PAGE_LIMIT_MAX,
    },
};
use url::Url;

pub mod error;
mod selected_list;
mod submission;

pub use error::ClientError;
pub use selected_list::SelectedList;
pub use submission::{FlushOutcome, SubmissionQueue};

/// Where queued submissions are delivered when their window closes.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn send_add(&self, id: ItemId) -> Result<(), ClientError>;
    async fn send_select(&self, id: ItemId) -> Result<(), ClientError>;
    async fn send_deselect(&self, id: ItemId) -> Result<(), ClientError>;
    async fn send_reorder(&self, order: &[ItemId]) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct SelectionClient {
    http: Client,
    base_url: Url,
}

impl SelectionClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(server_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn fetch_items(&self, query: &PageQuery) -> Result<ItemsPage, ClientError> {
        let res = self
            .http
            .get(self.endpoint(items_route())?)
            .query(query)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn fetch_selected(&self, query: &PageQuery) -> Result<ItemsPage, ClientError> {
        let res = self
            .http
            .get(self.endpoint(selected_route())?)
            .query(query)
            .send()
            .await?;
        decode(res).await
    }

    /// Walks every page of the selected list under `filter`.
    pub async fn fetch_all_selected(&self, filter: &str) -> Result<Vec<ItemId>, ClientError> {
        let mut all = Vec::new();
        loop {
            let page = self
                .fetch_selected(&PageQuery::new(filter, all.len(), PAGE_LIMIT_MAX))
                .await?;
            let exhausted = page.items.len() < page.limit || page.items.is_empty();
            all.extend(page.items);
            if exhausted {
                return Ok(all);
            }
        }
    }

    pub async fn add_item(&self, id: ItemId) -> Result<QueuedResponse, ClientError> {
        let res = self
            .http
            .post(self.endpoint(items_route())?)
            .json(&AddItemRequest { id: id.into() })
            .send()
            .await?;
        decode(res).await
    }

    pub async fn select_item(&self, id: ItemId) -> Result<QueuedResponse, ClientError> {
        let res = self
            .http
            .post(self.endpoint(&selected_item_route(id))?)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn deselect_item(&self, id: ItemId) -> Result<QueuedResponse, ClientError> {
        let res = self
            .http
            .delete(self.endpoint(&selected_item_route(id))?)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn reorder(&self, order: &[ItemId]) -> Result<QueuedResponse, ClientError> {
        let res = self
            .http
            .put(self.endpoint(reorder_route())?)
            .json(&ReorderRequest::from_order(order))
            .send()
            .await?;
        decode(res).await
    }

    pub async fn queue_stats(&self) -> Result<QueueStats, ClientError> {
        let res = self.http.get(self.endpoint(queue_route())?).send().await?;
        decode(res).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl SubmissionTransport for SelectionClient {
    async fn send_add(&self, id: ItemId) -> Result<(), ClientError> {
        self.add_item(id).await.map(drop)
    }

    async fn send_select(&self, id: ItemId) -> Result<(), ClientError> {
        self.select_item(id).await.map(drop)
    }

    async fn send_deselect(&self, id: ItemId) -> Result<(), ClientError> {
        self.deselect_item(id).await.map(drop)
    }

    async fn send_reorder(&self, order: &[ItemId]) -> Result<(), ClientError> {
        self.reorder(order).await.map(drop)
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }
    match res.json::<ApiError>().await {
        Ok(error) => Err(ClientError::Api {
            status: status.as_u16(),
            error,
        }),
        Err(_) => Err(ClientError::Status(status.as_u16())),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
