//! Submission Pipeline
//!
//! `submit` runs the local guards, serializes a copy of the form (dates
//! re-encoded for transmission), posts it with the CSRF and ajax headers and
//! hands the classified response to exactly one outcome handler. The save
//! control is re-enabled and relabelled on every path once the request
//! completes.
//!
//! `delete` confirms with the user first and never touches the modal.

pub mod feedback;
pub mod form_data;
pub mod response;

use crate::auth::LoginOverlay;
use crate::console::ConsoleContext;
use crate::core::entity::{EntityName, RecordId};
use crate::core::error::{
    ConsoleError, FieldErrors, LocalValidationError, NON_FIELD_ERRORS, RoutingError,
    ServerContractError,
};
use crate::core::events::ConsoleEvent;
use crate::core::field::FieldCategory;
use crate::core::validation::FormSnapshot;
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};
use crate::http::{HttpRequest, HttpResponse, TransportError};
use crate::modal::{ActiveForm, ModalController};
use response::{ResponseKind, classify};
use std::rc::Rc;

/// How a submission ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Accepted; the modal is closed and the page reloads
    Saved,
    /// The server sent a new fragment, now installed
    Rerendered(ActiveForm),
    /// A newer request started before this one resolved; its answer was
    /// not installed
    Stale,
}

pub struct SubmissionPipeline {
    ctx: Rc<ConsoleContext>,
}

impl SubmissionPipeline {
    pub fn new(ctx: Rc<ConsoleContext>) -> Self {
        Self { ctx }
    }

    /// Validate, send and interpret the active form
    pub async fn submit(&self, modal: &ModalController) -> Result<SubmitOutcome, ConsoleError> {
        let active = modal.active().ok_or(ConsoleError::NoActiveForm)?;
        let (data, label) = self.prepare(modal, &active)?;

        let generation = modal.begin_request();
        tracing::debug!(action = %active.action, generation, fields = data.len(), "submitting form");
        let request = self
            .ctx
            .state_changing(HttpRequest::post(active.action.clone(), data), Some(active.form));
        let result = self.ctx.transport().send(request).await;

        if let (Some(button), Some(label)) = (active.save_button, label) {
            self.restore_button(button, &label)?;
        }

        if !modal.is_current(generation) {
            modal.recompute_gate()?;
            return self.handle_stale(modal, &active, generation, result);
        }

        match result {
            Ok(response) => self.handle_response(modal, &active, &response),
            Err(e) => {
                tracing::warn!(action = %active.action, error = %e, "submission failed");
                self.ctx.page().alert(&self.ctx.config.messages.network_error);
                Err(e.into())
            }
        }
    }

    /// Local guards, serialization and the "saving" state of the button
    ///
    /// Returns the data to send and the button's original label.
    fn prepare(
        &self,
        modal: &ModalController,
        active: &ActiveForm,
    ) -> Result<(Vec<(String, String)>, Option<String>), ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        let messages = &self.ctx.config.messages;
        let mut doc = self.ctx.document_mut();
        if !doc.contains(active.form) {
            return Err(ConsoleError::NoActiveForm);
        }
        feedback::clear(&mut *doc, active.form, selectors)?;

        let snapshot = FormSnapshot::capture(&*doc, active.form);
        let report = modal.gate().evaluate(&snapshot);

        if let Some(failure) = report.validation.failure() {
            feedback::show_messages(&mut *doc, active.form, &[failure.message.clone()], selectors)?;
            feedback::mark_invalid(&mut *doc, failure.element, selectors)?;
            let is_choice = snapshot
                .field_by_element(failure.element)
                .is_some_and(|f| f.category == FieldCategory::GroupedChoice);
            if !is_choice {
                doc.set_value(failure.element, "")?;
            }
            doc.focus(failure.element)?;
            drop(doc);

            tracing::debug!(field = %failure.field, "local validation failed");
            self.ctx.page().alert(&failure.message);
            return Err(LocalValidationError::Invalid {
                field: failure.field.clone(),
                message: failure.message.clone(),
            }
            .into());
        }

        if !report.is_complete() {
            drop(doc);
            tracing::debug!(missing = ?report.missing, bad_dates = ?report.bad_dates, "form incomplete");
            self.ctx.page().alert(&messages.incomplete);
            return Err(LocalValidationError::Incomplete {
                message: messages.incomplete.clone(),
            }
            .into());
        }

        let data = form_data::serialize(&*doc, active.form);
        let label = match active.save_button.filter(|b| doc.contains(*b)) {
            Some(button) => {
                let original = button_label(&*doc, button);
                set_button_label(&mut *doc, button, &messages.saving_label)?;
                doc.stamp_attribute(button, "disabled", "")?;
                Some(original)
            }
            None => None,
        };
        Ok((data, label))
    }

    fn restore_button(&self, button: ElementId, label: &str) -> Result<(), DocumentError> {
        let mut doc = self.ctx.document_mut();
        if !doc.contains(button) {
            return Ok(());
        }
        set_button_label(&mut *doc, button, label)?;
        doc.remove_attribute(button, "disabled")?;
        doc.stamp_attribute(button, "aria-disabled", "false")?;
        Ok(())
    }

    fn handle_response(
        &self,
        modal: &ModalController,
        active: &ActiveForm,
        response: &HttpResponse,
    ) -> Result<SubmitOutcome, ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        match classify(response, &selectors.entity_modal_id) {
            ResponseKind::Success { .. } => {
                modal.close()?;
                tracing::info!(entity = ?active.entity, mode = ?active.mode, "record saved");
                self.ctx.publish(ConsoleEvent::SubmissionSaved {
                    entity: active.entity.clone(),
                    mode: active.mode,
                });
                self.ctx.page().reload();
                Ok(SubmitOutcome::Saved)
            }
            ResponseKind::FieldErrors(errors) => {
                self.show_field_errors(active, &errors)?;
                Err(errors.into())
            }
            ResponseKind::Fragment { html, warning } => {
                if let Some(message) = warning {
                    modal.server_warning(message);
                }
                Ok(SubmitOutcome::Rerendered(modal.rerender(&html)?))
            }
            ResponseKind::AuthFailure { status, redirected } => {
                let mut doc = self.ctx.document_mut();
                if doc.contains(active.form) {
                    feedback::show_messages(
                        &mut *doc,
                        active.form,
                        &[self.ctx.config.messages.session_expired.clone()],
                        selectors,
                    )?;
                }
                drop(doc);
                Err(LoginOverlay::new(self.ctx.clone()).require(status, redirected))
            }
            ResponseKind::Rejected { status, message } => {
                let mut doc = self.ctx.document_mut();
                if doc.contains(active.form) {
                    feedback::show_messages(&mut *doc, active.form, &[message.clone()], selectors)?;
                }
                drop(doc);
                tracing::warn!(status, %message, "submission rejected");
                self.ctx.page().alert(&message);
                self.ctx.publish(ConsoleEvent::SubmissionRejected {
                    message: message.clone(),
                });
                Err(ServerContractError::Rejected { status, message }.into())
            }
            ResponseKind::Unrecognized { status, excerpt } => {
                tracing::warn!(status, %excerpt, "unrecognized submission response");
                self.ctx
                    .page()
                    .alert(&self.ctx.config.messages.unexpected_response);
                self.ctx.page().reload();
                Err(ServerContractError::UnexpectedShape { status, excerpt }.into())
            }
        }
    }

    /// A response to a submission that a newer request has overtaken
    ///
    /// Nothing is installed into or marked on the newer form. Outcomes that do
    /// not touch the modal still happen: the login overlay, the reload after a
    /// save and the alert for a refusal.
    fn handle_stale(
        &self,
        modal: &ModalController,
        active: &ActiveForm,
        generation: u64,
        result: Result<HttpResponse, TransportError>,
    ) -> Result<SubmitOutcome, ConsoleError> {
        let Ok(response) = result else {
            modal.drop_stale(generation);
            return Ok(SubmitOutcome::Stale);
        };
        match classify(&response, &self.ctx.config.selectors.entity_modal_id) {
            ResponseKind::AuthFailure { status, redirected } => {
                Err(LoginOverlay::new(self.ctx.clone()).require(status, redirected))
            }
            ResponseKind::Success { .. } => {
                tracing::info!(entity = ?active.entity, generation, "record saved by an overtaken submission");
                self.ctx.publish(ConsoleEvent::SubmissionSaved {
                    entity: active.entity.clone(),
                    mode: active.mode,
                });
                self.ctx.page().reload();
                Ok(SubmitOutcome::Saved)
            }
            ResponseKind::Rejected { status, message } => {
                tracing::warn!(status, %message, generation, "overtaken submission rejected");
                self.ctx.page().alert(&message);
                self.ctx.publish(ConsoleEvent::SubmissionRejected {
                    message: message.clone(),
                });
                Err(ServerContractError::Rejected { status, message }.into())
            }
            _ => {
                modal.drop_stale(generation);
                Ok(SubmitOutcome::Stale)
            }
        }
    }

    /// Panel with every message, offending fields marked, the first real one
    /// focused and cleared, then one alert with the first message
    fn show_field_errors(&self, active: &ActiveForm, errors: &FieldErrors) -> Result<(), ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        let mut doc = self.ctx.document_mut();
        if doc.contains(active.form) {
            let lines: Vec<String> = errors
                .0
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |m| {
                        if field == NON_FIELD_ERRORS {
                            m.clone()
                        } else {
                            format!("{}: {}", field, m)
                        }
                    })
                })
                .collect();
            feedback::show_messages(&mut *doc, active.form, &lines, selectors)?;

            let mut first: Option<ElementId> = None;
            for field in errors.0.keys().filter(|k| k.as_str() != NON_FIELD_ERRORS) {
                let marked = feedback::mark_invalid_by_name(&mut *doc, active.form, field, selectors)?;
                if first.is_none() {
                    first = marked.first().copied();
                }
            }
            if let Some(el) = first {
                let is_choice = matches!(doc.input_type(el).as_deref(), Some("checkbox" | "radio"));
                if !is_choice {
                    doc.set_value(el, "")?;
                }
                doc.focus(el)?;
            }
        }
        drop(doc);

        let fields: Vec<String> = errors.0.keys().cloned().collect();
        tracing::debug!(fields = ?fields, "server reported field errors");
        if let Some(message) = errors.first_message() {
            self.ctx.page().alert(message);
        }
        self.ctx
            .publish(ConsoleEvent::FieldErrorsReported { fields });
        Ok(())
    }

    /// Confirm, then delete record `id` of `entity`
    pub async fn delete(&self, entity: &EntityName, id: &RecordId) -> Result<(), ConsoleError> {
        let messages = &self.ctx.config.messages;
        if !self
            .ctx
            .page()
            .confirm(&messages.confirm_delete_for(entity.as_str()))
        {
            tracing::debug!(%entity, %id, "delete declined");
            return Err(RoutingError::Declined {
                entity: entity.clone(),
            }
            .into());
        }

        let path = self.ctx.paths.delete(entity, id);
        let request = self.ctx.state_changing(HttpRequest::post(path, Vec::new()), None);
        let response = match self.ctx.transport().send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%entity, %id, error = %e, "delete request failed");
                self.ctx.page().alert(&messages.network_error);
                return Err(e.into());
            }
        };

        match classify(&response, &self.ctx.config.selectors.entity_modal_id) {
            ResponseKind::Success { .. } => {
                tracing::info!(%entity, %id, "record deleted");
                self.ctx.publish(ConsoleEvent::RecordDeleted {
                    entity: entity.clone(),
                    id: id.clone(),
                });
                self.ctx.page().reload();
                Ok(())
            }
            ResponseKind::AuthFailure { status, redirected } => {
                Err(LoginOverlay::new(self.ctx.clone()).require(status, redirected))
            }
            ResponseKind::Rejected { status, message } => {
                tracing::warn!(%entity, %id, status, %message, "delete rejected");
                self.ctx.page().alert(&message);
                Err(ServerContractError::Rejected { status, message }.into())
            }
            ResponseKind::FieldErrors(errors) => {
                if let Some(message) = errors.first_message() {
                    self.ctx.page().alert(message);
                }
                Err(errors.into())
            }
            other => {
                tracing::warn!(%entity, %id, status = response.status, kind = other.name(), "unexpected delete response");
                self.ctx.page().alert(&messages.unexpected_response);
                self.ctx.page().reload();
                Err(ServerContractError::UnexpectedShape {
                    status: response.status,
                    excerpt: other.excerpt(),
                }
                .into())
            }
        }
    }
}

/// Visible label of a button (`value` for `<input>` buttons)
fn button_label<D: Document + ?Sized>(doc: &D, button: ElementId) -> String {
    if doc.is_tag(button, "input") {
        doc.attribute(button, "value").unwrap_or_default().to_string()
    } else {
        doc.text(button)
    }
}

fn set_button_label<D: Document + ?Sized>(
    doc: &mut D,
    button: ElementId,
    label: &str,
) -> Result<(), DocumentError> {
    if doc.is_tag(button, "input") {
        doc.set_attribute(button, "value", label)
    } else {
        doc.set_text(button, label)
    }
}
