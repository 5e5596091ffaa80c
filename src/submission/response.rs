//! Response classification
//!
//! Every server answer is classified exactly once into a [`ResponseKind`];
//! callers branch on the kind, never on the raw body.

use crate::core::error::FieldErrors;
use crate::http::HttpResponse;
use indexmap::IndexMap;
use serde_json::Value;

const EXCERPT_LEN: usize = 200;

/// What a response means for the workflow
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    /// `{success: true}` without a fragment
    Success { message: Option<String> },
    /// `{errors: {field: [messages]}}`, in the server's key order
    FieldErrors(FieldErrors),
    /// Markup to install in the modal (`{html}` or an HTML body)
    Fragment {
        html: String,
        warning: Option<String>,
    },
    /// 401, 403 or a followed redirect
    AuthFailure {
        status: Option<u16>,
        redirected: bool,
    },
    /// `{success: false, error: "..."}`
    Rejected { status: u16, message: String },
    /// Anything else
    Unrecognized { status: u16, excerpt: String },
}

impl ResponseKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKind::Success { .. } => "success",
            ResponseKind::FieldErrors(_) => "field_errors",
            ResponseKind::Fragment { .. } => "fragment",
            ResponseKind::AuthFailure { .. } => "auth_failure",
            ResponseKind::Rejected { .. } => "rejected",
            ResponseKind::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Short description used in contract errors
    pub fn excerpt(&self) -> String {
        match self {
            ResponseKind::Unrecognized { excerpt, .. } => excerpt.clone(),
            ResponseKind::Rejected { message, .. } => message.clone(),
            other => format!("unexpected {} response", other.name()),
        }
    }
}

/// Classify `response`; `modal_id` is the entity modal's id, used to spot
/// modal markup inside non-JSON bodies
pub fn classify(response: &HttpResponse, modal_id: &str) -> ResponseKind {
    if response.redirected || matches!(response.status, 401 | 403) {
        return ResponseKind::AuthFailure {
            status: matches!(response.status, 401 | 403).then_some(response.status),
            redirected: response.redirected,
        };
    }

    if let Some(json) = response.json_body() {
        return classify_json(response.status, &json);
    }

    if response.status < 500 && looks_like_fragment(&response.body, modal_id) {
        return ResponseKind::Fragment {
            html: response.body.clone(),
            warning: None,
        };
    }

    ResponseKind::Unrecognized {
        status: response.status,
        excerpt: excerpt(&response.body),
    }
}

fn classify_json(status: u16, json: &Value) -> ResponseKind {
    let Some(object) = json.as_object() else {
        return ResponseKind::Unrecognized {
            status,
            excerpt: excerpt(&json.to_string()),
        };
    };

    if let Some(errors) = object.get("errors").and_then(parse_field_errors) {
        return ResponseKind::FieldErrors(errors);
    }

    if let Some(html) = object
        .get("html")
        .and_then(Value::as_str)
        .filter(|h| !h.trim().is_empty())
    {
        return ResponseKind::Fragment {
            html: html.to_string(),
            warning: string_field(object.get("warning")),
        };
    }

    let success = object.get("success").and_then(Value::as_bool);
    if success == Some(true) {
        return ResponseKind::Success {
            message: string_field(object.get("message")),
        };
    }

    if let Some(message) = string_field(object.get("error")) {
        return ResponseKind::Rejected { status, message };
    }

    ResponseKind::Unrecognized {
        status,
        excerpt: excerpt(&json.to_string()),
    }
}

/// Accept `{field: ["msg"]}`, `{field: "msg"}` and Django's
/// `{field: [{"message": "msg", "code": ...}]}`
fn parse_field_errors(value: &Value) -> Option<FieldErrors> {
    let object = value.as_object()?;
    let mut errors = IndexMap::new();
    for (field, messages) in object {
        let messages: Vec<String> = match messages {
            Value::Array(items) => items.iter().filter_map(message_text).collect(),
            other => message_text(other).into_iter().collect(),
        };
        if !messages.is_empty() {
            errors.insert(field.clone(), messages);
        }
    }
    (!errors.is_empty()).then_some(FieldErrors(errors))
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Non-JSON bodies that carry modal or form markup
fn looks_like_fragment(body: &str, modal_id: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    (!modal_id.is_empty() && body.contains(modal_id))
        || lower.contains("class=\"modal")
        || lower.contains("modal-body")
        || lower.contains("<form")
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
