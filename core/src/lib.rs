//! Request layer for the memo mini-program backend.
//!
//! # Overview
//! Wraps a host-provided HTTP transport with bearer-token authentication,
//! cache-busting for GET requests and a uniform success/error envelope, then
//! exposes three endpoint groups: users, memos and chat.
//!
//! # Design
//! - `RequestClient` is I/O free: `build` produces an `HttpRequest`, `parse`
//!   normalizes an `HttpResponse` (host-does-IO pattern).
//! - `ApiClient` adds a `Transport` and runs the round-trip itself; the
//!   reqwest-backed `ReqwestTransport` is the default.
//! - The token store and the base address are injected at construction.
//! - Response shapes are classified once, in `envelope`, before any payload
//!   handling.

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;

pub use api::ApiClient;
pub use client::{Clock, FixedClock, RequestClient, RequestDescriptor, SystemClock};
pub use config::{ClientConfig, ConfigError, Environment};
pub use endpoints::chat::{ChatMessage, ChatOptions, ChatRequest};
pub use endpoints::memo::Pagination;
pub use error::{ApiError, DEFAULT_FAILURE_MESSAGE};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{MemoryStore, NoToken, TokenStore, TOKEN_KEY};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
