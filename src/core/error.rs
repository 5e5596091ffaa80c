//! Typed error handling for the console controller
//!
//! Every failure a workflow can end in maps to exactly one category, so
//! callers can match on what happened instead of inspecting messages.
//!
//! # Error Categories
//!
//! - [`LocalValidationError`]: detected in the browser, no request was sent
//! - [`AuthenticationError`]: 401/403/redirect, always routed to the login overlay
//! - [`FieldErrors`]: per-field messages reported by the server
//! - [`TransportError`]: the request never produced a usable response
//! - [`ServerContractError`]: the server answered with something unexpected
//! - [`RoutingError`]: a trigger could not be resolved into an entity action
//!
//! # Example
//!
//! ```rust,ignore
//! match console.submit().await {
//!     Ok(SubmitOutcome::Saved) => {}
//!     Err(ConsoleError::Field(errors)) => {
//!         println!("first offending field: {:?}", errors.first_field());
//!     }
//!     Err(ConsoleError::Authentication(_)) => { /* overlay already shown */ }
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use crate::core::entity::{EntityAction, EntityName};
use crate::dom::DocumentError;
use crate::http::TransportError;
use indexmap::IndexMap;
use std::fmt;

/// The main error type for console workflows
#[derive(Debug)]
pub enum ConsoleError {
    /// Client-side validation stopped the workflow before any request
    LocalValidation(LocalValidationError),

    /// The server rejected the session
    Authentication(AuthenticationError),

    /// The server reported per-field validation errors
    Field(FieldErrors),

    /// Network-level failure
    Transport(TransportError),

    /// The server's answer did not match the contract
    ServerContract(ServerContractError),

    /// A trigger could not be turned into an entity action
    Routing(RoutingError),

    /// An element operation failed
    Document(DocumentError),

    /// An operation needed an open entity form and there was none
    NoActiveForm,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::LocalValidation(e) => write!(f, "{}", e),
            ConsoleError::Authentication(e) => write!(f, "{}", e),
            ConsoleError::Field(e) => write!(f, "{}", e),
            ConsoleError::Transport(e) => write!(f, "{}", e),
            ConsoleError::ServerContract(e) => write!(f, "{}", e),
            ConsoleError::Routing(e) => write!(f, "{}", e),
            ConsoleError::Document(e) => write!(f, "Document error: {}", e),
            ConsoleError::NoActiveForm => write!(f, "No entity form is open"),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::LocalValidation(e) => Some(e),
            ConsoleError::Authentication(e) => Some(e),
            ConsoleError::Field(e) => Some(e),
            ConsoleError::Transport(e) => Some(e),
            ConsoleError::ServerContract(e) => Some(e),
            ConsoleError::Routing(e) => Some(e),
            ConsoleError::Document(e) => Some(e),
            ConsoleError::NoActiveForm => None,
        }
    }
}

impl ConsoleError {
    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::LocalValidation(e) => e.error_code(),
            ConsoleError::Authentication(_) => "AUTHENTICATION_ERROR",
            ConsoleError::Field(_) => "FIELD_ERROR",
            ConsoleError::Transport(_) => "TRANSPORT_ERROR",
            ConsoleError::ServerContract(e) => e.error_code(),
            ConsoleError::Routing(e) => e.error_code(),
            ConsoleError::Document(_) => "DOCUMENT_ERROR",
            ConsoleError::NoActiveForm => "NO_ACTIVE_FORM",
        }
    }

    /// Whether the typed data is still in the form and the user can retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConsoleError::LocalValidation(_)
                | ConsoleError::Field(_)
                | ConsoleError::Transport(_)
                | ConsoleError::ServerContract(ServerContractError::Rejected { .. })
        )
    }
}

// =============================================================================
// Local Validation Errors
// =============================================================================

/// Problems found before anything is sent
#[derive(Debug, Clone, PartialEq)]
pub enum LocalValidationError {
    /// The validator's first failure
    Invalid { field: String, message: String },

    /// Some visible field is missing or holds an incomplete date
    Incomplete { message: String },
}

impl fmt::Display for LocalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalValidationError::Invalid { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            LocalValidationError::Incomplete { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LocalValidationError {}

impl LocalValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            LocalValidationError::Invalid { .. } => "LOCAL_VALIDATION_ERROR",
            LocalValidationError::Incomplete { .. } => "INCOMPLETE_FORM",
        }
    }
}

impl From<LocalValidationError> for ConsoleError {
    fn from(err: LocalValidationError) -> Self {
        ConsoleError::LocalValidation(err)
    }
}

// =============================================================================
// Authentication Errors
// =============================================================================

/// The session is missing or not allowed to do this
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationError {
    /// HTTP status when the failure came from a status code
    pub status: Option<u16>,

    /// The request was answered through a redirect (usually to the login page)
    pub redirected: bool,

    /// Server-provided explanation, when there was one
    pub message: Option<String>,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.status) {
            (Some(message), _) => write!(f, "Authentication required: {}", message),
            (None, Some(status)) => write!(f, "Authentication required (HTTP {})", status),
            (None, None) => write!(f, "Authentication required (redirected)"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

impl From<AuthenticationError> for ConsoleError {
    fn from(err: AuthenticationError) -> Self {
        ConsoleError::Authentication(err)
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Per-field messages in the server's order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors(pub IndexMap<String, Vec<String>>);

/// Key the server uses for errors that belong to no single field
pub const NON_FIELD_ERRORS: &str = "__all__";

impl FieldErrors {
    /// First key in the server's order that names a real field
    pub fn first_field(&self) -> Option<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .find(|k| *k != NON_FIELD_ERRORS)
    }

    /// First message in the server's order, field or not
    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|msgs| msgs.iter())
            .map(String::as_str)
            .next()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "Validation errors: {}", msgs.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

impl From<FieldErrors> for ConsoleError {
    fn from(err: FieldErrors) -> Self {
        ConsoleError::Field(err)
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

impl From<TransportError> for ConsoleError {
    fn from(err: TransportError) -> Self {
        ConsoleError::Transport(err)
    }
}

// =============================================================================
// Server Contract Errors
// =============================================================================

/// The server answered, but not with a shape the workflow can use
#[derive(Debug, Clone, PartialEq)]
pub enum ServerContractError {
    /// Unknown JSON or unrecognized text; the page is reloaded
    UnexpectedShape { status: u16, excerpt: String },

    /// `{success: false, error: "..."}`: a refusal with an explanation
    Rejected { status: u16, message: String },
}

impl fmt::Display for ServerContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerContractError::UnexpectedShape { status, excerpt } => {
                write!(f, "Unexpected response (HTTP {}): {}", status, excerpt)
            }
            ServerContractError::Rejected { status, message } => {
                write!(f, "Request rejected (HTTP {}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ServerContractError {}

impl ServerContractError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerContractError::UnexpectedShape { .. } => "SERVER_CONTRACT_ERROR",
            ServerContractError::Rejected { .. } => "SERVER_REJECTED",
        }
    }
}

impl From<ServerContractError> for ConsoleError {
    fn from(err: ServerContractError) -> Self {
        ConsoleError::ServerContract(err)
    }
}

// =============================================================================
// Routing Errors
// =============================================================================

/// Why a trigger element did not lead anywhere
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// No entity could be inferred from the element or its ancestors
    NoEntity,

    /// The element is not an add/edit/delete trigger
    NoAction,

    /// Edit or delete without a record identifier
    MissingId {
        entity: EntityName,
        action: EntityAction,
    },

    /// The user declined the delete confirmation
    Declined { entity: EntityName },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NoEntity => write!(f, "Could not determine the entity for this action"),
            RoutingError::NoAction => write!(f, "Element is not an entity action trigger"),
            RoutingError::MissingId { entity, action } => {
                write!(f, "Cannot {} {}: no record id found", action, entity)
            }
            RoutingError::Declined { entity } => {
                write!(f, "Deletion of {} cancelled by the user", entity)
            }
        }
    }
}

impl std::error::Error for RoutingError {}

impl RoutingError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RoutingError::NoEntity => "UNKNOWN_ENTITY",
            RoutingError::NoAction => "NOT_A_TRIGGER",
            RoutingError::MissingId { .. } => "MISSING_RECORD_ID",
            RoutingError::Declined { .. } => "ACTION_DECLINED",
        }
    }
}

impl From<RoutingError> for ConsoleError {
    fn from(err: RoutingError) -> Self {
        ConsoleError::Routing(err)
    }
}

impl From<DocumentError> for ConsoleError {
    fn from(err: DocumentError) -> Self {
        ConsoleError::Document(err)
    }
}
