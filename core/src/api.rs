//! Async client that runs the round-trip itself.
//!
//! `ApiClient` pairs a `RequestClient` with a `Transport`: every call builds
//! one request, executes it once, and normalizes the outcome. There is no
//! retry, queueing or de-duplication; concurrent calls are independent.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use crate::client::{Clock, RequestClient, RequestDescriptor, SystemClock};
use crate::config::ClientConfig;
use crate::endpoints::chat::{ChatApi, ChatMessage, ChatOptions, ChatRequest};
use crate::endpoints::memo::MemoApi;
use crate::endpoints::user::UserApi;
use crate::error::ApiError;
use crate::store::TokenStore;
use crate::transport::{ReqwestTransport, Transport, TransportError};

pub struct ApiClient<T, S, C = SystemClock> {
    requests: RequestClient<S, C>,
    transport: T,
}

impl<S: TokenStore> ApiClient<ReqwestTransport, S> {
    /// Client over reqwest, honouring the configured timeout.
    pub fn from_config(config: &ClientConfig, store: S) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::new(RequestClient::new(config, store), transport))
    }
}

impl<T: Transport, S: TokenStore, C: Clock> ApiClient<T, S, C> {
    pub fn new(requests: RequestClient<S, C>, transport: T) -> Self {
        Self {
            requests,
            transport,
        }
    }

    pub fn requests(&self) -> &RequestClient<S, C> {
        &self.requests
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request and normalize its outcome.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        let request = self.requests.build(&descriptor)?;
        let response = self.transport.execute(request).await.map_err(|e| {
            error!(method = %descriptor.method, path = %descriptor.path, error = %e, "api transport failure");
            ApiError::Transport(e)
        })?;
        self.requests.parse(response)
    }

    pub async fn send_as<R: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<R, ApiError> {
        let value = self.send(descriptor).await?;
        serde_json::from_value(value).map_err(ApiError::Deserialization)
    }

    /// Send a conversation to the chat backend. Message order is kept as given.
    pub async fn chat_with_ai(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<Value, ApiError> {
        let request = self.requests.build_chat(&ChatRequest::new(messages, options))?;
        let response = self.transport.execute(request).await.map_err(|e| {
            error!(error = %e, "chat transport failure");
            ApiError::Transport(e)
        })?;
        self.requests.parse_chat(response)
    }

    pub fn users(&self) -> UserApi<'_, T, S, C> {
        UserApi::new(self)
    }

    pub fn memos(&self) -> MemoApi<'_, T, S, C> {
        MemoApi::new(self)
    }

    pub fn chat(&self) -> ChatApi<'_, T, S, C> {
        ChatApi::new(self)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::client::FixedClock;
    use crate::http::HttpMethod;
    use crate::store::MemoryStore;
    use crate::transport::TransportErrorKind;
    use serde_json::json;

    fn api(transport: ScriptedTransport) -> ApiClient<ScriptedTransport, MemoryStore, FixedClock> {
        let config = ClientConfig::new("http://localhost:3000/api").unwrap();
        let requests = RequestClient::new(&config, MemoryStore::with_token("tok")).with_clock(FixedClock(42));
        ApiClient::new(requests, transport)
    }

    #[tokio::test]
    async fn send_resolves_envelope_data() {
        let client = api(ScriptedTransport::default().reply(200, r#"{"code":200,"data":{"n":1}}"#));
        let value = client.send(RequestDescriptor::get("/memo/detail/1")).await.unwrap();
        assert_eq!(value, json!({"n": 1}));

        let sent = client.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://localhost:3000/api/memo/detail/1?_t=42");
        assert_eq!(sent[0].header("Authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn transport_error_surfaces_unmodified() {
        let raw = TransportError::new(TransportErrorKind::Timeout, "request timed out");
        let client = api(ScriptedTransport::default().fail(raw.clone()));
        let err = client
            .send(RequestDescriptor::new(HttpMethod::Post, "/user/login"))
            .await
            .unwrap_err();
        match err {
            ApiError::Transport(inner) => assert_eq!(inner, raw),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_as_reports_shape_mismatch() {
        let client = api(ScriptedTransport::default().reply(200, r#"{"code":200,"data":"x"}"#));
        let err = client
            .send_as::<Vec<String>>(RequestDescriptor::get("/memo/list"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[tokio::test]
    async fn chat_transport_error_surfaces_unmodified() {
        let raw = TransportError::new(TransportErrorKind::Connect, "refused");
        let client = api(ScriptedTransport::default().fail(raw.clone()));
        let err = client
            .chat_with_ai(vec![ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(inner) if inner == raw));
    }
}
