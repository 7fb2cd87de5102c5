//! Plain-data HTTP types handed to the transport.
//!
//! # Design
//! `BuiltRequest` is the only thing the crate produces. It carries a relative
//! URI, a verb and an optional JSON payload and nothing else: the host joins
//! the URI onto its base URL and performs the round-trip itself. Payload
//! objects are `serde_json::Map` values, which keep keys sorted, so the
//! rendered body is byte-stable for equal inputs.

use std::fmt;

use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized request described as plain data.
///
/// Produced by `RequestBuilder::build`. Two requests are equal when their
/// URI, method and payload are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    method: HttpMethod,
    uri: String,
    payload: Option<Value>,
}

impl BuiltRequest {
    pub(crate) fn new(method: HttpMethod, uri: String, payload: Option<Value>) -> Self {
        Self { method, uri, payload }
    }

    /// Relative path plus query string. Never contains a scheme or host.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    /// JSON body, absent for requests that carry none.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// The payload rendered as compact JSON with sorted keys.
    pub fn body(&self) -> Option<String> {
        self.payload.as_ref().map(Value::to_string)
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        match self.payload {
            Some(_) => vec![("content-type".to_string(), "application/json".to_string())],
            None => Vec::new(),
        }
    }
}
