//! Login overlay
//!
//! Every authentication failure (401, 403, a followed redirect) lands here:
//! the overlay is shown with an inline message and the workflow that hit it
//! ends with [`AuthenticationError`]. The overlay's own form posts to the
//! login endpoint and understands `{success, redirect_url}`,
//! `{require_otp, error}` and `{error}` answers.

use crate::console::ConsoleContext;
use crate::core::error::{AuthenticationError, ConsoleError};
use crate::core::events::ConsoleEvent;
use crate::dom::{DocumentExt, ElementId};
use crate::http::{HttpRequest, HttpResponse};
use crate::modal::password::wire_password_toggles;
use crate::modal::singleton::{ensure_singleton, login_modal_skeleton, show_modal};
use crate::submission::form_data;
use serde_json::Value;
use std::rc::Rc;

const ERROR_CLASS: &str = "login-error";
const OTP_GROUP_CLASS: &str = "otp-group";

/// How a login attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Navigation to the contained URL was requested
    LoggedIn(String),
    /// The server wants a one-time code; the OTP field is revealed
    OtpRequired,
    /// Shown inline
    Failed(String),
}

pub struct LoginOverlay {
    ctx: Rc<ConsoleContext>,
}

impl LoginOverlay {
    pub fn new(ctx: Rc<ConsoleContext>) -> Self {
        Self { ctx }
    }

    /// The login modal, created on first use
    pub fn modal(&self) -> Result<ElementId, ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        let skeleton = login_modal_skeleton(selectors, &self.ctx.config.login.action);
        let modal = ensure_singleton(
            &mut *self.ctx.document_mut(),
            &selectors.login_modal_id,
            &skeleton,
        )?;
        Ok(modal)
    }

    pub fn form(&self) -> Option<ElementId> {
        let doc = self.ctx.document();
        doc.element_by_id(&self.ctx.config.selectors.login_form_id)
    }

    /// Show the overlay, with `message` inline when given
    pub fn show(&self, message: Option<&str>) -> Result<ElementId, ConsoleError> {
        let modal = self.modal()?;
        let mut doc = self.ctx.document_mut();
        show_modal(&mut *doc, modal)?;
        if let Some(message) = message {
            if let Some(slot) = doc.find_first(modal, |d, el| d.has_class(el, ERROR_CLASS)) {
                doc.set_text(slot, message)?;
                doc.set_displayed(slot, true)?;
            }
        }
        wire_password_toggles(&mut *doc, modal)?;
        Ok(modal)
    }

    /// Route an authentication failure to the overlay
    ///
    /// Returns the error the interrupted workflow ends with. Failing to show
    /// the overlay is logged; the authentication error still wins.
    pub fn require(&self, status: Option<u16>, redirected: bool) -> ConsoleError {
        let message = self.ctx.config.messages.session_expired.clone();
        if let Err(e) = self.show(Some(&message)) {
            tracing::warn!(error = %e, "login overlay could not be shown");
        }
        tracing::warn!(?status, redirected, "authentication required");
        self.ctx
            .publish(ConsoleEvent::AuthenticationRequired { status });
        AuthenticationError {
            status,
            redirected,
            message: Some(message),
        }
        .into()
    }

    /// Post the login form
    pub async fn submit(&self) -> Result<LoginOutcome, ConsoleError> {
        self.modal()?;
        let form = self.form().ok_or(ConsoleError::NoActiveForm)?;
        let (action, data) = {
            let doc = self.ctx.document();
            let action = doc
                .attribute(form, "action")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(&self.ctx.config.login.action)
                .to_string();
            (action, form_data::serialize(&*doc, form))
        };

        tracing::debug!(path = %action, "submitting login form");
        let request = self
            .ctx
            .state_changing(HttpRequest::post(action, data), Some(form));
        let response = match self.ctx.transport().send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "login request failed");
                self.show_error(&self.ctx.config.messages.network_error)?;
                return Err(e.into());
            }
        };

        self.handle_response(&response)
    }

    fn handle_response(&self, response: &HttpResponse) -> Result<LoginOutcome, ConsoleError> {
        let messages = &self.ctx.config.messages;
        let json = response.json_body().unwrap_or(Value::Null);
        let error = json
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if response.status != 429 && json.get("success").and_then(Value::as_bool) == Some(true) {
            let redirect = json
                .get("redirect_url")
                .and_then(Value::as_str)
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(&self.ctx.config.login.default_redirect)
                .to_string();
            tracing::info!(redirect = %redirect, "logged in");
            self.ctx.page().navigate(&redirect);
            self.ctx.publish(ConsoleEvent::LoggedIn {
                redirect_url: redirect.clone(),
            });
            return Ok(LoginOutcome::LoggedIn(redirect));
        }

        if json.get("require_otp").and_then(Value::as_bool) == Some(true) {
            let message = error.unwrap_or_else(|| messages.login_failed.clone());
            self.reveal_otp()?;
            self.show_error(&message)?;
            tracing::debug!("one-time code required");
            return Ok(LoginOutcome::OtpRequired);
        }

        let message = error.unwrap_or_else(|| messages.login_failed.clone());
        tracing::warn!(status = response.status, %message, "login refused");
        self.show_error(&message)?;
        Ok(LoginOutcome::Failed(message))
    }

    fn show_error(&self, message: &str) -> Result<(), ConsoleError> {
        self.show(Some(message))?;
        Ok(())
    }

    /// Unhide the OTP field (and its group) and focus it
    fn reveal_otp(&self) -> Result<(), ConsoleError> {
        let Some(form) = self.form() else {
            return Ok(());
        };
        let otp_name = &self.ctx.config.selectors.otp_field_name;
        let mut doc = self.ctx.document_mut();
        let Some(field) = doc.find_first(form, |d, el| d.attribute_is(el, "name", otp_name)) else {
            return Ok(());
        };
        if let Some(group) = doc.closest(field, |d, el| d.has_class(el, OTP_GROUP_CLASS)) {
            doc.set_displayed(group, true)?;
        }
        doc.set_displayed(field, true)?;
        doc.stamp_attribute(field, "required", "")?;
        doc.focus(field)?;
        Ok(())
    }
}
