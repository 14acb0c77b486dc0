//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! instead of `String`, raw pointers instead of `Vec`, and enums with explicit
//! discriminants. Payloads and codes cross the boundary as JSON text so the
//! host decides how to decode them. Conversions live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::borrow::Cow;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use memo_api_core::{ApiError, HttpMethod, RequestClient, TokenStore};
use serde_json::Value;
use tracing::warn;

/// Host callback that reads a key from its persistent key-value store.
///
/// Returns null when the key is absent. The returned string is borrowed: it
/// only has to stay valid until the callback returns control to Rust, which
/// copies it immediately.
pub type FfiStorageGet = extern "C" fn(key: *const c_char, user_data: *mut c_void) -> *const c_char;

/// `TokenStore` backed by the host's storage callback.
pub struct FfiTokenStore {
    pub(crate) get: Option<FfiStorageGet>,
    pub(crate) user_data: *mut c_void,
}

impl TokenStore for FfiTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let get = self.get?;
        let c_key = CString::new(key).ok()?;
        let value = get(c_key.as_ptr(), self.user_data);
        if value.is_null() {
            return None;
        }
        let value = unsafe { CStr::from_ptr(value) };
        if value.to_str().is_err() {
            warn!(key, "stored value is not valid UTF-8; invalid bytes replaced");
        }
        Some(value.to_string_lossy().into_owned())
    }
}

/// Opaque handle to a `RequestClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiMemoClient {
    pub(crate) inner: RequestClient<FfiTokenStore>,
}

/// Copy a Rust string into a heap-allocated C string. Interior NULs are dropped.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Borrow a C string as `&str`; null or invalid UTF-8 yields `None`.
pub(crate) fn from_c_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

/// Borrow a C string, replacing invalid UTF-8 with U+FFFD; null yields `None`.
pub(crate) fn from_c_str_lossy<'a>(s: *const c_char) -> Option<Cow<'a, str>> {
    if s.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(s) }.to_string_lossy())
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `memo_build_*` functions. The host executes the request and
/// passes the response back through `memo_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: memo_api_core::HttpRequest) -> *mut Self {
        let url = to_c_string(req.url);
        let body = match req.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host constructs this after its request primitive succeeds (any
/// status), then passes a pointer to a `memo_parse_*` function. The FFI layer
/// reads but does not free these fields. Transport failures never come here;
/// the host reports those to its own caller directly.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome category of a parse call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorKind {
    Ok = 0,
    Http = 1,
    Server = 2,
    Chat = 3,
    Serialization = 4,
    Deserialization = 5,
    Transport = 6,
    Panic = 7,
    NullArg = 8,
}

/// Result envelope for every parse operation.
///
/// On success `error_kind` is `Ok`, `message` and `code` are null, and
/// `payload` holds the resolved value as JSON text. On failure `message` is
/// always set; `code` holds the HTTP status or the server's `code` as JSON
/// text when the error has one, and `payload` is null.
#[repr(C)]
pub struct FfiMemoResult {
    pub error_kind: FfiErrorKind,
    pub message: *mut c_char,
    pub http_status: u16,
    pub code: *mut c_char,
    pub payload: *mut c_char,
}

impl FfiMemoResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    pub(crate) fn ok(payload: &Value) -> *mut Self {
        FfiMemoResult {
            error_kind: FfiErrorKind::Ok,
            message: std::ptr::null_mut(),
            http_status: 0,
            code: std::ptr::null_mut(),
            payload: to_c_string(payload.to_string()),
        }
        .boxed()
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_kind, http_status) = match &err {
            ApiError::Http { status, .. } => (FfiErrorKind::Http, *status),
            ApiError::Server { .. } => (FfiErrorKind::Server, 0),
            ApiError::Chat { status, .. } => (FfiErrorKind::Chat, *status),
            ApiError::Serialization(_) => (FfiErrorKind::Serialization, 0),
            ApiError::Deserialization(_) => (FfiErrorKind::Deserialization, 0),
            ApiError::Transport(_) => (FfiErrorKind::Transport, 0),
        };
        let code = match err.code() {
            Some(code) => to_c_string(code.to_string()),
            None => std::ptr::null_mut(),
        };
        FfiMemoResult {
            error_kind,
            message: to_c_string(err.message()),
            http_status,
            code,
            payload: std::ptr::null_mut(),
        }
        .boxed()
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorKind::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorKind::Panic, msg)
    }

    fn failure(error_kind: FfiErrorKind, msg: &str) -> *mut Self {
        FfiMemoResult {
            error_kind,
            message: to_c_string(msg),
            http_status: 0,
            code: std::ptr::null_mut(),
            payload: std::ptr::null_mut(),
        }
        .boxed()
    }
}
