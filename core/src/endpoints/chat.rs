//! Chat endpoints.
//!
//! Completions go through `RequestClient::build_chat` / `parse_chat` since the
//! chat backend reports failure in an `error` field instead of a `code`
//! envelope. Session management uses the generic path; those bodies carry no
//! envelope and resolve verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiClient;
use crate::client::{Clock, RequestDescriptor};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::store::TokenStore;
use crate::transport::Transport;

pub const DEFAULT_MODEL: &str = "x1";

/// One turn of a conversation. `role` is usually `user` or `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOptions {
    pub model: Option<String>,
    /// Continue an existing session; a new one is opened when absent.
    pub session_id: Option<String>,
}

/// Wire body of `POST /chat`. `sessionId` is always present, `null` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Empty strings in `options` fall back to the defaults.
    pub fn new(messages: Vec<ChatMessage>, options: &ChatOptions) -> Self {
        let model = options
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        let session_id = options.session_id.clone().filter(|s| !s.is_empty());
        Self {
            messages,
            model,
            session_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleUpdate {
    pub title: String,
}

pub fn history() -> RequestDescriptor {
    RequestDescriptor::get("/chat/sessions")
}

pub fn messages(session_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/chat/sessions/{session_id}"))
}

pub fn update_session_title(session_id: &str, title: &str) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::new(HttpMethod::Put, format!("/chat/sessions/{session_id}")).with_json(&TitleUpdate {
        title: title.to_string(),
    })
}

pub fn delete_session(session_id: &str) -> RequestDescriptor {
    RequestDescriptor::new(HttpMethod::Delete, format!("/chat/sessions/{session_id}"))
}

pub struct ChatApi<'a, T, S, C> {
    client: &'a ApiClient<T, S, C>,
}

impl<'a, T: Transport, S: TokenStore, C: Clock> ChatApi<'a, T, S, C> {
    pub(crate) fn new(client: &'a ApiClient<T, S, C>) -> Self {
        Self { client }
    }

    pub async fn chat_with_ai(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<Value, ApiError> {
        self.client.chat_with_ai(messages, options).await
    }

    pub async fn get_history(&self) -> Result<Value, ApiError> {
        self.client.send(history()).await
    }

    pub async fn get_messages(&self, session_id: &str) -> Result<Value, ApiError> {
        self.client.send(messages(session_id)).await
    }

    pub async fn update_session_title(&self, session_id: &str, title: &str) -> Result<Value, ApiError> {
        self.client.send(update_session_title(session_id, title)?).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<Value, ApiError> {
        self.client.send(delete_session(session_id)).await
    }
}
