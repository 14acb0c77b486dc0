//! Request building and response normalization.
//!
//! # Design
//! `RequestClient` holds the base address, a read-only token store and a
//! clock, and carries no other state between calls. `build` turns a
//! `RequestDescriptor` into an `HttpRequest`; `parse` turns the matching
//! `HttpResponse` into exactly one resolved payload or one `ApiError`. The
//! caller (an `ApiClient` transport, or a host across the FFI) performs the
//! round-trip in between. Chat completions have their own `build_chat` /
//! `parse_chat` pair because that backend signals failure differently.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::endpoints::chat::ChatRequest;
use crate::envelope::{error_field, is_success_code, message_field, ChatEnvelope, Envelope};
use crate::error::{ApiError, DEFAULT_FAILURE_MESSAGE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::store::TokenStore;

/// Name of the cache-busting query parameter added to GET requests.
pub const CACHE_BUST_PARAM: &str = "_t";

/// Source of the cache-busting timestamp.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// One call against the backend: relative path, method and optional JSON body.
///
/// A GET never sends a body: `build` drops `body` for GET (logging a warning
/// when one was set). Pass GET parameters in `path` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Attach a serializable body.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::Serialization)?);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct RequestClient<S, C = SystemClock> {
    base_url: String,
    store: S,
    clock: C,
}

impl<S: TokenStore> RequestClient<S> {
    pub fn new(config: &ClientConfig, store: S) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            clock: SystemClock,
        }
    }
}

impl<S: TokenStore, C: Clock> RequestClient<S, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RequestClient<S, C2> {
        RequestClient {
            base_url: self.base_url,
            store: self.store,
            clock,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn build(&self, descriptor: &RequestDescriptor) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{}", self.base_url, descriptor.path);
        if descriptor.method == HttpMethod::Get {
            let separator = if descriptor.path.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str(CACHE_BUST_PARAM);
            url.push('=');
            url.push_str(&self.clock.now_millis().to_string());
        }

        // A GET cannot carry a body; everything else sends `{}` when empty.
        let body = match (descriptor.method, &descriptor.body) {
            (HttpMethod::Get, Some(_)) => {
                warn!(path = %descriptor.path, "dropping body of GET request");
                None
            }
            (HttpMethod::Get, None) => None,
            (_, Some(value)) => Some(serde_json::to_string(value).map_err(ApiError::Serialization)?),
            (_, None) => Some("{}".to_string()),
        };

        debug!(method = %descriptor.method, url = %url, has_body = body.is_some(), "api request");
        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers: self.headers(),
            body,
        })
    }

    /// Normalize a generic response into its payload.
    pub fn parse(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let status = response.status;
        let body = response.json();
        debug!(status, "api response");

        if status != 200 && status != 201 {
            let message = message_field(&body).unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            warn!(status, message = %message, "request failed with http status");
            return Err(ApiError::Http { status, message });
        }

        match Envelope::decode(body) {
            Envelope::Coded { code, data, .. } if is_success_code(&code) => Ok(data),
            Envelope::Coded { code, message, .. } => {
                let message = message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                warn!(code = %code, message = %message, "request rejected by server");
                Err(ApiError::Server { code, message })
            }
            Envelope::Raw(value) => Ok(value),
        }
    }

    /// `parse`, then deserialize the payload into `T`.
    pub fn parse_as<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        let value = self.parse(response)?;
        serde_json::from_value(value).map_err(ApiError::Deserialization)
    }

    pub fn build_chat(&self, request: &ChatRequest) -> Result<HttpRequest, ApiError> {
        let url = format!("{}/chat", self.base_url);
        let body = serde_json::to_string(request).map_err(ApiError::Serialization)?;
        debug!(url = %url, messages = request.messages.len(), model = %request.model, "chat request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: self.headers(),
            body: Some(body),
        })
    }

    /// Normalize a chat completion response. Only 200 counts as success.
    pub fn parse_chat(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let status = response.status;
        let body = response.json();
        debug!(status, "chat response");

        if status != 200 {
            let message = error_field(&body).unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            warn!(status, message = %message, "chat failed with http status");
            return Err(ApiError::Chat { status, message });
        }

        match ChatEnvelope::decode(body) {
            ChatEnvelope::Answered(value) => Ok(value),
            ChatEnvelope::Failed(message) => {
                warn!(message = %message, "chat rejected by server");
                Err(ApiError::Chat { status, message })
            }
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.store.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }
}
