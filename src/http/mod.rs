//! Network seam
//!
//! Every request the console makes goes through a [`Transport`]. Two
//! implementations ship with the crate: [`ScriptedTransport`], which answers
//! from a queue and records what it was asked, and (feature `http`)
//! [`ReqwestTransport`], which talks to a real server with a cookie store.
//!
//! The console is single-threaded, so the trait is `?Send`.

pub mod csrf;
pub mod scripted;

#[cfg(feature = "http")]
pub mod client;

pub use csrf::resolve_csrf_token;
pub use scripted::ScriptedTransport;

#[cfg(feature = "http")]
pub use client::ReqwestTransport;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP method; the console only ever reads forms and posts them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A request as the console builds it
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the site root, e.g. `/client/update/42/`
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// Multipart text fields, in form order (POST only)
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            form,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First form value sent under `name`
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response as far as the console cares
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// The final URL differs from the requested one
    pub redirected: bool,
    pub body: String,
}

impl HttpResponse {
    /// 200 with a JSON body
    pub fn json(value: &Value) -> Self {
        Self::json_with_status(200, value)
    }

    pub fn json_with_status(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            redirected: false,
            body: value.to_string(),
        }
    }

    /// 200 with an HTML body
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            redirected: false,
            body: body.into(),
        }
    }

    /// Empty body with the given status
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            redirected: false,
            body: String::new(),
        }
    }

    /// A response that was reached through a redirect (e.g. to the login page)
    pub fn redirected(mut self) -> Self {
        self.redirected = true;
        self
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON when it is declared as JSON or looks like an object
    pub fn json_body(&self) -> Option<Value> {
        if self.is_json() || self.body.trim_start().starts_with('{') {
            serde_json::from_str(&self.body).ok()
        } else {
            None
        }
    }
}

/// The request never produced a response
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not read response body: {0}")]
    Body(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Sends requests on behalf of the console
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::post("/client/create/", vec![("name".into(), "Asha".into())])
            .with_header("X-Requested-With", "XMLHttpRequest");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header("x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(request.form_value("name"), Some("Asha"));
        assert_eq!(request.form_value("missing"), None);
    }

    #[test]
    fn test_json_body_detection() {
        let response = HttpResponse::json(&json!({"success": true}));
        assert!(response.is_json());
        assert_eq!(response.json_body(), Some(json!({"success": true})));

        let sniffed = HttpResponse {
            content_type: Some("text/html".to_string()),
            ..HttpResponse::html("{\"success\": true}")
        };
        assert_eq!(sniffed.json_body(), Some(json!({"success": true})));

        assert_eq!(HttpResponse::html("<div></div>").json_body(), None);
    }

    #[test]
    fn test_status_helpers() {
        assert!(HttpResponse::status(204).is_success());
        assert!(!HttpResponse::status(403).is_success());
        assert!(HttpResponse::status(200).redirected().redirected);
    }
}
