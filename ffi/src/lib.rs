//! C-ABI wrapper around `memo-api-core`.
//!
//! # Overview
//! Lets a host shell that owns the network and the key-value store (the
//! mini-program container, a native app) build authenticated requests and
//! normalize responses without linking an async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The token is read through a host callback on every build, so logging in
//!   or out on the host side takes effect immediately.
//! - `memo_build_request` covers the user, memo and chat-session endpoints;
//!   chat completions have their own `memo_build_chat` / `memo_parse_chat_response`.
//! - The host owns all returned pointers and must release them with the
//!   matching `memo_free_*` function.

pub mod types;

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use memo_api_core::{ChatMessage, ChatOptions, ChatRequest, ClientConfig, HttpResponse, RequestClient, RequestDescriptor};
use serde_json::Value;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url` (origin plus `/api`).
///
/// `storage_get` may be null, in which case requests go out unauthenticated.
/// `user_data` is passed back to `storage_get` untouched.
/// Returns null if `base_url` is null or empty, or if an internal panic occurs.
/// The caller must free the returned pointer with `memo_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn memo_client_new(
    base_url: *const c_char,
    storage_get: Option<FfiStorageGet>,
    user_data: *mut c_void,
) -> *mut FfiMemoClient {
    catch_unwind(|| {
        let Some(url) = from_c_str(base_url) else {
            return std::ptr::null_mut();
        };
        let Ok(config) = ClientConfig::new(url) else {
            return std::ptr::null_mut();
        };
        let store = FfiTokenStore {
            get: storage_get,
            user_data,
        };
        let client = RequestClient::new(&config, store);
        Box::into_raw(Box::new(FfiMemoClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `memo_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memo_client_free(client: *mut FfiMemoClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a request for `path` (relative, may carry a query string).
///
/// `body_json` may be null. It is ignored for `Get`, which never carries a
/// body. Returns null if `client` or `path` is null, or if `body_json` is not
/// valid JSON.
/// The caller must free the returned pointer with `memo_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn memo_build_request(
    client: *const FfiMemoClient,
    method: FfiHttpMethod,
    path: *const c_char,
    body_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(path) = from_c_str(path) else {
            return std::ptr::null_mut();
        };
        let body = if body_json.is_null() {
            None
        } else {
            let parsed = from_c_str(body_json).and_then(|s| serde_json::from_str::<Value>(s).ok());
            match parsed {
                Some(value) => Some(value),
                None => return std::ptr::null_mut(),
            }
        };
        let client = unsafe { &*client };
        let descriptor = RequestDescriptor {
            path: path.to_string(),
            method: method.into(),
            body,
        };
        match client.inner.build(&descriptor) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a chat completion request.
///
/// `messages_json` is a JSON array of `{role, content}` objects, kept in the
/// given order. `model` and `session_id` may be null or empty.
/// Returns null if `client` or `messages_json` is null or malformed.
#[unsafe(no_mangle)]
pub extern "C" fn memo_build_chat(
    client: *const FfiMemoClient,
    messages_json: *const c_char,
    model: *const c_char,
    session_id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let messages: Vec<ChatMessage> =
            match from_c_str(messages_json).and_then(|s| serde_json::from_str(s).ok()) {
                Some(messages) => messages,
                None => return std::ptr::null_mut(),
            };
        let options = ChatOptions {
            model: from_c_str(model).map(str::to_string),
            session_id: from_c_str(session_id).map(str::to_string),
        };
        let client = unsafe { &*client };
        match client.inner.build_chat(&ChatRequest::new(messages, &options)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

// Invalid UTF-8 is replaced rather than dropped, so a mangled error body still
// fails instead of reading as an empty (successful) one.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = from_c_str_lossy(resp.body).unwrap_or_default();
    HttpResponse::new(resp.status, body)
}

/// Normalize a response to a request built by `memo_build_request`.
#[unsafe(no_mangle)]
pub extern "C" fn memo_parse_response(
    client: *const FfiMemoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiMemoResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiMemoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiMemoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse(ffi_response_to_core(resp)) {
            Ok(payload) => FfiMemoResult::ok(&payload),
            Err(e) => FfiMemoResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiMemoResult::panic("panic in memo_parse_response"))
}

/// Normalize a response to a request built by `memo_build_chat`.
#[unsafe(no_mangle)]
pub extern "C" fn memo_parse_chat_response(
    client: *const FfiMemoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiMemoResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiMemoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiMemoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_chat(ffi_response_to_core(resp)) {
            Ok(payload) => FfiMemoResult::ok(&payload),
            Err(e) => FfiMemoResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiMemoResult::panic("panic in memo_parse_chat_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `memo_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memo_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiMemoResult` returned by any `memo_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memo_free_result(result: *mut FfiMemoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.message);
        free_c_string(result.code);
        free_c_string(result.payload);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn memo_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
