//! Account endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::api::ApiClient;
use crate::client::{Clock, RequestDescriptor};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::store::TokenStore;
use crate::transport::Transport;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub remember: bool,
}

pub fn register(username: &str, password: &str, confirm_password: &str) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::new(HttpMethod::Post, "/user/register").with_json(&RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: confirm_password.to_string(),
    })
}

pub fn login(username: &str, password: &str, remember: bool) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::new(HttpMethod::Post, "/user/login").with_json(&LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
        remember,
    })
}

pub struct UserApi<'a, T, S, C> {
    client: &'a ApiClient<T, S, C>,
}

impl<'a, T: Transport, S: TokenStore, C: Clock> UserApi<'a, T, S, C> {
    pub(crate) fn new(client: &'a ApiClient<T, S, C>) -> Self {
        Self { client }
    }

    pub async fn register(&self, username: &str, password: &str, confirm_password: &str) -> Result<Value, ApiError> {
        self.client.send(register(username, password, confirm_password)?).await
    }

    /// The resolved payload typically carries the session token; storing it
    /// is the caller's job.
    pub async fn login(&self, username: &str, password: &str, remember: bool) -> Result<Value, ApiError> {
        self.client.send(login(username, password, remember)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_body_uses_camel_case() {
        let desc = register("ann", "pw", "pw").unwrap();
        assert_eq!(desc.method, HttpMethod::Post);
        assert_eq!(desc.path, "/user/register");
        assert_eq!(
            desc.body,
            Some(json!({"username": "ann", "password": "pw", "confirmPassword": "pw"}))
        );
    }

    #[test]
    fn login_carries_remember_flag() {
        let desc = login("ann", "pw", false).unwrap();
        assert_eq!(desc.path, "/user/login");
        assert_eq!(
            desc.body,
            Some(json!({"username": "ann", "password": "pw", "remember": false}))
        );
        let desc = login("ann", "pw", true).unwrap();
        assert_eq!(desc.body.unwrap()["remember"], true);
    }

    #[test]
    fn mismatched_confirmation_is_not_checked_locally() {
        let desc = register("ann", "pw", "other").unwrap();
        assert_eq!(desc.body.unwrap()["confirmPassword"], "other");
    }
}
