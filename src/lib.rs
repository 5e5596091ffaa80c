//! # Modal-RS
//!
//! A headless controller for server-rendered admin consoles: modal-based
//! create/edit/delete workflows over an open-ended set of entities.
//!
//! ## Features
//!
//! - **Entity Router**: infers entity, record id and action from arbitrary trigger markup
//! - **Single Reusable Modal**: every open replaces the form wholesale; stale responses are dropped
//! - **Live Validation**: field classification, input masks and a Save-Gate kept in sync with the form
//! - **Uniform Submission**: success, field errors, re-rendered fragments, auth and transport failures
//! - **Login Overlay**: every 401/403/redirect ends up in one place, OTP aware
//! - **Password Toggles**: exactly one toggle per real password field, decoys skipped
//! - **Configuration-Based**: selectors, CSRF sources and messages from YAML
//!
//! The browser is reached through three seams: [`dom::Document`],
//! [`http::Transport`] and [`page::Page`]. In-crate implementations
//! ([`dom::MemoryDocument`], [`http::ScriptedTransport`],
//! [`page::RecordingPage`]) drive the controller headlessly.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modal::prelude::*;
//! use std::rc::Rc;
//!
//! let doc = MemoryDocument::from_markup(r#"
//!     <table data-entity="client">
//!       <tr data-id="42"><td><button class="edit-btn">Edit</button></td></tr>
//!     </table>"#)?;
//! let button = doc.find_first(doc.root(), |d, el| d.has_class(el, "edit-btn")).unwrap();
//!
//! let transport = Rc::new(ScriptedTransport::new());
//! transport.push(HttpResponse::json(&serde_json::json!({"html": "<form>...</form>"})));
//!
//! let console = Console::new(ConsoleConfig::default(), doc, transport, Rc::new(RecordingPage::new()));
//! console.handle_click(button).await?;
//! assert!(console.modal().is_open());
//! ```

pub mod auth;
pub mod config;
pub mod console;
pub mod core;
pub mod dom;
pub mod http;
pub mod modal;
pub mod page;
pub mod router;
pub mod submission;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Facade ===
    pub use crate::console::{ClickOutcome, Console, ConsoleContext, FieldEvent};

    // === Core ===
    pub use crate::core::{
        entity::{EntityAction, EntityName, EntityPaths, EntityTarget, FormMode, RecordId},
        error::{
            AuthenticationError, ConsoleError, FieldErrors, LocalValidationError, RoutingError,
            ServerContractError,
        },
        events::{ConsoleEvent, EventBus, EventEnvelope},
        field::{FieldCategory, FieldFormat, MaskKind},
        validation::{
            FieldClassifier, FormSnapshot, SaveGate, SaveGateReport, ValidationOutcome, Validator,
        },
    };

    // === Components ===
    pub use crate::auth::{LoginOutcome, LoginOverlay};
    pub use crate::modal::{ActiveForm, ModalController, OpenOutcome};
    pub use crate::router::EntityRouter;
    pub use crate::submission::{SubmissionPipeline, SubmitOutcome};

    // === Seams ===
    pub use crate::dom::{Document, DocumentError, DocumentExt, ElementId, MemoryDocument, Rect};
    #[cfg(feature = "http")]
    pub use crate::http::ReqwestTransport;
    pub use crate::http::{HttpRequest, HttpResponse, ScriptedTransport, Transport, TransportError};
    pub use crate::page::{Page, PageEffect, RecordingPage};

    // === Config ===
    pub use crate::config::ConsoleConfig;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
}
