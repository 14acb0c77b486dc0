//! Response envelope detection.
//!
//! # Design
//! Two backends answer this client. The account/memo service wraps payloads
//! as `{code, data, message}`; the chat service returns bare bodies and flags
//! failure with an `error` field. Bodies are classified once, here, into a
//! tagged value so `RequestClient` never probes fields ad hoc.

use serde_json::Value;

/// Envelope of a generic (non-chat) response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{code, data, message?}` as sent by the account/memo service.
    Coded {
        code: Value,
        data: Value,
        message: Option<String>,
    },
    /// Any body without a `code` field, kept verbatim.
    Raw(Value),
}

impl Envelope {
    pub fn decode(body: Value) -> Self {
        match body {
            Value::Object(mut map) if map.contains_key("code") => {
                let code = map.remove("code").unwrap_or(Value::Null);
                let data = map.remove("data").unwrap_or(Value::Null);
                let message = truthy_text(map.get("message"));
                Envelope::Coded {
                    code,
                    data,
                    message,
                }
            }
            other => Envelope::Raw(other),
        }
    }
}

/// Envelope of a chat completion response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEnvelope {
    /// The body carried a truthy `error` field.
    Failed(String),
    /// No error; the whole body is the answer.
    Answered(Value),
}

impl ChatEnvelope {
    pub fn decode(body: Value) -> Self {
        match error_field(&body) {
            Some(message) => ChatEnvelope::Failed(message),
            None => ChatEnvelope::Answered(body),
        }
    }
}

/// True for the two envelope codes that mean success.
pub fn is_success_code(code: &Value) -> bool {
    matches!(code.as_f64(), Some(c) if c == 200.0 || c == 201.0)
}

/// `message` of an error body, if truthy. Non-string values are rendered as JSON.
pub fn message_field(body: &Value) -> Option<String> {
    truthy_text(body.as_object().and_then(|m| m.get("message")))
}

/// `error` of a chat body, if truthy. Non-string values are rendered as JSON.
pub fn error_field(body: &Value) -> Option<String> {
    truthy_text(body.as_object().and_then(|m| m.get("error")))
}

/// Null, `false`, `""` and `0` are falsy; anything else becomes text.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
