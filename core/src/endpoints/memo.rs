//! Memo CRUD endpoints. Ids are opaque and inserted into paths as given.

use serde::Serialize;
use serde_json::Value;

use crate::api::ApiClient;
use crate::client::{Clock, RequestDescriptor};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::store::TokenStore;
use crate::transport::Transport;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Body of create and update.
#[derive(Debug, Clone, Serialize)]
pub struct MemoInput {
    pub title: String,
    pub content: String,
}

impl MemoInput {
    fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

pub fn list(pagination: Pagination) -> RequestDescriptor {
    RequestDescriptor::get(format!(
        "/memo/list?page={}&pageSize={}",
        pagination.page, pagination.page_size
    ))
}

pub fn detail(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/memo/detail/{id}"))
}

pub fn create(title: &str, content: &str) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::new(HttpMethod::Post, "/memo/create").with_json(&MemoInput::new(title, content))
}

pub fn update(id: &str, title: &str, content: &str) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::new(HttpMethod::Put, format!("/memo/update/{id}")).with_json(&MemoInput::new(title, content))
}

pub fn delete(id: &str) -> RequestDescriptor {
    RequestDescriptor::new(HttpMethod::Delete, format!("/memo/delete/{id}"))
}

pub struct MemoApi<'a, T, S, C> {
    client: &'a ApiClient<T, S, C>,
}

impl<'a, T: Transport, S: TokenStore, C: Clock> MemoApi<'a, T, S, C> {
    pub(crate) fn new(client: &'a ApiClient<T, S, C>) -> Self {
        Self { client }
    }

    pub async fn list(&self, pagination: Pagination) -> Result<Value, ApiError> {
        self.client.send(list(pagination)).await
    }

    pub async fn detail(&self, id: &str) -> Result<Value, ApiError> {
        self.client.send(detail(id)).await
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Value, ApiError> {
        self.client.send(create(title, content)?).await
    }

    pub async fn update(&self, id: &str, title: &str, content: &str) -> Result<Value, ApiError> {
        self.client.send(update(id, title, content)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.client.send(delete(id)).await
    }
}
