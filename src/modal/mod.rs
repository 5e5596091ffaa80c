//! Modal Controller
//!
//! Owns the single reusable entity modal. Every open fetches a fresh form
//! fragment, replaces the previous one wholesale and re-runs the attachment
//! sequence ([`behaviors::attach`]). Nothing is patched incrementally, so
//! closing needs no teardown.
//!
//! Each fetch or submission takes a new request generation. Markup from a
//! response whose generation is no longer current is never installed, so a
//! slow response can never overwrite the content of a newer one. Stale
//! authentication failures still reach the login overlay.

pub mod behaviors;
pub mod password;
pub mod singleton;

use crate::auth::LoginOverlay;
use crate::console::ConsoleContext;
use crate::core::entity::{EntityName, FormMode, RecordId};
use crate::core::error::{ConsoleError, ServerContractError};
use crate::core::events::ConsoleEvent;
use crate::core::validation::{FormSnapshot, SaveGate, SaveGateReport};
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};
use crate::http::HttpRequest;
use crate::submission::response::{ResponseKind, classify};
use singleton::{
    entity_modal_skeleton, ensure_singleton, fragment_has_root, hide_modal, show_modal,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// The form currently installed in the entity modal
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveForm {
    pub modal: ElementId,
    pub form: ElementId,
    pub save_button: Option<ElementId>,
    pub entity: Option<EntityName>,
    pub mode: FormMode,
    /// Endpoint the form submits to
    pub action: String,
}

/// How an open request ended
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened(ActiveForm),
    /// A newer request started before this one resolved
    Stale,
}

#[derive(Debug, Default)]
struct ModalState {
    generation: u64,
    active: Option<ActiveForm>,
    /// Save controls already routed to submission, by element identity
    bound_save_buttons: HashSet<ElementId>,
}

pub struct ModalController {
    ctx: Rc<ConsoleContext>,
    gate: SaveGate,
    state: RefCell<ModalState>,
}

impl ModalController {
    pub fn new(ctx: Rc<ConsoleContext>) -> Self {
        let gate = SaveGate::new(ctx.config.gate.clone(), &ctx.config.messages);
        Self {
            ctx,
            gate,
            state: RefCell::new(ModalState::default()),
        }
    }

    pub fn gate(&self) -> &SaveGate {
        &self.gate
    }

    /// Start a request and return its generation
    pub fn begin_request(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        state.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.state.borrow().generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Log and announce a response that lost the race
    pub fn drop_stale(&self, generation: u64) {
        let current = self.generation();
        tracing::warn!(generation, current, "stale response dropped");
        self.ctx
            .publish(ConsoleEvent::StaleResponseDropped { generation, current });
    }

    pub fn active(&self) -> Option<ActiveForm> {
        self.state.borrow().active.clone()
    }

    pub fn modal_element(&self) -> Option<ElementId> {
        self.ctx
            .document()
            .element_by_id(&self.ctx.config.selectors.entity_modal_id)
    }

    pub fn is_open(&self) -> bool {
        self.modal_element()
            .is_some_and(|modal| self.ctx.document().is_displayed(modal))
    }

    /// Whether `el` is a save control routed to submission
    pub fn is_save_button(&self, el: ElementId) -> bool {
        self.state.borrow().bound_save_buttons.contains(&el) && self.ctx.document().contains(el)
    }

    /// Number of live save controls routed to submission
    pub fn bound_save_buttons(&self) -> usize {
        let doc = self.ctx.document();
        self.state
            .borrow()
            .bound_save_buttons
            .iter()
            .filter(|el| doc.contains(**el))
            .count()
    }

    /// Fetch the empty form for `entity` and install it
    pub async fn open_create(&self, entity: &EntityName) -> Result<OpenOutcome, ConsoleError> {
        let fetch = self.ctx.paths.fetch_new(entity);
        let action = self.ctx.paths.create(entity);
        self.load(entity, fetch, action).await
    }

    /// Fetch the form for record `id` of `entity` and install it
    pub async fn open_edit(
        &self,
        entity: &EntityName,
        id: &RecordId,
    ) -> Result<OpenOutcome, ConsoleError> {
        let fetch = self.ctx.paths.fetch_existing(entity, id);
        let action = self.ctx.paths.update(entity, id);
        self.load(entity, fetch, action).await
    }

    async fn load(
        &self,
        entity: &EntityName,
        fetch: String,
        action: String,
    ) -> Result<OpenOutcome, ConsoleError> {
        let generation = self.begin_request();
        tracing::debug!(%entity, path = %fetch, generation, "fetching form fragment");

        let request = self.ctx.ajax(HttpRequest::get(fetch));
        let result = self.ctx.transport().send(request).await;

        if !self.is_current(generation) {
            if let Ok(response) = &result {
                if let ResponseKind::AuthFailure { status, redirected } =
                    classify(response, &self.ctx.config.selectors.entity_modal_id)
                {
                    return Err(LoginOverlay::new(self.ctx.clone()).require(status, redirected));
                }
            }
            self.drop_stale(generation);
            return Ok(OpenOutcome::Stale);
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%entity, error = %e, "form fragment request failed");
                self.ctx.page().alert(&self.ctx.config.messages.network_error);
                return Err(e.into());
            }
        };

        match classify(&response, &self.ctx.config.selectors.entity_modal_id) {
            ResponseKind::Fragment { html, warning } => {
                if let Some(message) = warning {
                    self.server_warning(message);
                }
                let active = self.install(&html, Some(entity.clone()), Some(action), true)?;
                tracing::info!(%entity, mode = ?active.mode, "entity modal opened");
                self.ctx.publish(ConsoleEvent::ModalOpened {
                    entity: entity.clone(),
                    id: active_record_id(&active.action),
                    mode: active.mode,
                });
                Ok(OpenOutcome::Opened(active))
            }
            ResponseKind::AuthFailure { status, redirected } => {
                Err(LoginOverlay::new(self.ctx.clone()).require(status, redirected))
            }
            ResponseKind::Rejected { status, message } => {
                tracing::warn!(%entity, status, %message, "server refused to render form");
                self.ctx.page().alert(&message);
                Err(ServerContractError::Rejected { status, message }.into())
            }
            other => {
                tracing::warn!(%entity, status = response.status, kind = other.name(), "unusable form fragment response");
                self.ctx
                    .page()
                    .alert(&self.ctx.config.messages.unexpected_response);
                Err(ServerContractError::UnexpectedShape {
                    status: response.status,
                    excerpt: other.excerpt(),
                }
                .into())
            }
        }
    }

    /// Replace the modal content with a fragment the server returned after a
    /// submission
    pub fn rerender(&self, html: &str) -> Result<ActiveForm, ConsoleError> {
        let entity = self.active().and_then(|a| a.entity);
        let active = self.install(html, entity.clone(), None, false)?;
        tracing::debug!(entity = ?entity, "entity modal re-rendered");
        self.ctx.publish(ConsoleEvent::ModalRerendered { entity });
        Ok(active)
    }

    pub fn server_warning(&self, message: String) {
        tracing::warn!(%message, "server warning");
        self.ctx.publish(ConsoleEvent::ServerWarning { message });
    }

    /// Install `html` into the entity modal and run the attachment sequence
    ///
    /// A fragment carrying its own modal root replaces the existing modal
    /// wholesale; anything else goes into the skeleton's `.modal-body`.
    /// `action` overrides the form's endpoint; without one the fragment's own
    /// `action`, then the previous form's, is kept. `first_open` marks the
    /// install that answers an open request; only then does a create form get
    /// its empty dates prefilled.
    pub fn install(
        &self,
        html: &str,
        entity: Option<EntityName>,
        action: Option<String>,
        first_open: bool,
    ) -> Result<ActiveForm, ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        let today = self.ctx.page().today();
        let previous_action = self.active().map(|a| a.action);

        let mut doc = self.ctx.document_mut();
        let modal = if fragment_has_root(html, &selectors.entity_modal_id) {
            if let Some(old) = doc.element_by_id(&selectors.entity_modal_id) {
                doc.remove_element(old)?;
            }
            let root = doc.root();
            doc.insert_markup(root, html)?;
            doc.element_by_id(&selectors.entity_modal_id)
                .ok_or_else(|| DocumentError::Markup("modal root vanished".to_string()))?
        } else {
            let modal = ensure_singleton(
                &mut *doc,
                &selectors.entity_modal_id,
                &entity_modal_skeleton(selectors),
            )?;
            let body = doc
                .find_first(modal, |d, el| d.has_class(el, "modal-body"))
                .unwrap_or(modal);
            doc.clear_children(body)?;
            doc.insert_markup(body, html)?;
            modal
        };

        let form = doc
            .find_first(modal, |d, el| d.is_tag(el, "form"))
            .ok_or_else(|| ServerContractError::UnexpectedShape {
                status: 200,
                excerpt: "fragment contains no form".to_string(),
            })?;

        let action = action
            .or_else(|| {
                doc.attribute(form, "action")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
            })
            .or(previous_action)
            .unwrap_or_default();
        doc.stamp_attribute(form, "action", &action)?;
        let mode = FormMode::from_action(&action);

        if let Some(entity) = &entity {
            if let Some(title) = doc.find_first(modal, |d, el| d.has_class(el, "modal-title")) {
                if doc.text(title).trim().is_empty() || doc.has_attribute(title, "data-generated") {
                    let verb = match mode {
                        FormMode::Create => "Add",
                        FormMode::Update => "Edit",
                    };
                    doc.set_text(title, &format!("{} {}", verb, entity))?;
                    doc.stamp_attribute(title, "data-generated", "true")?;
                }
            }
        }

        // Shown first: attachment only touches fields that are laid out.
        show_modal(&mut *doc, modal)?;
        let prefill = (first_open && mode == FormMode::Create).then_some(today);
        let attached = behaviors::attach(&mut *doc, modal, form, prefill)?;
        tracing::trace!(?attached, "behaviors attached");

        let save_button = doc
            .element_by_id(&selectors.save_button_id)
            .filter(|b| doc.is_within(*b, modal))
            .or_else(|| {
                doc.find_first(form, |d, el| {
                    (d.is_tag(el, "button") || d.is_tag(el, "input"))
                        && d.attribute_is(el, "type", "submit")
                })
            });
        if let Some(button) = save_button {
            self.bind_save_button(&mut *doc, button)?;
        }

        let report = self.gate.evaluate(&FormSnapshot::capture(&*doc, form));
        if let Some(button) = save_button {
            behaviors::apply_gate(&mut *doc, button, &report)?;
        }
        drop(doc);

        let active = ActiveForm {
            modal,
            form,
            save_button,
            entity,
            mode,
            action,
        };
        self.state.borrow_mut().active = Some(active.clone());
        Ok(active)
    }

    /// Route `button` to submission once per element lifetime
    fn bind_save_button(
        &self,
        doc: &mut dyn Document,
        button: ElementId,
    ) -> Result<(), DocumentError> {
        let mut state = self.state.borrow_mut();
        state.bound_save_buttons.retain(|el| doc.contains(*el));
        if state.bound_save_buttons.insert(button) {
            doc.stamp_attribute(button, "data-save-bound", "true")?;
            tracing::debug!(button = %button, "save button bound");
        }
        Ok(())
    }

    /// Hide the entity modal; the installed form stays until the next open
    pub fn close(&self) -> Result<(), ConsoleError> {
        let Some(modal) = self.modal_element() else {
            return Ok(());
        };
        hide_modal(&mut *self.ctx.document_mut(), modal)?;
        tracing::debug!("entity modal closed");
        self.ctx.publish(ConsoleEvent::ModalClosed);
        Ok(())
    }

    /// Re-evaluate the Save-Gate for the active form and apply it
    pub fn recompute_gate(&self) -> Result<Option<SaveGateReport>, ConsoleError> {
        let Some(active) = self.active() else {
            return Ok(None);
        };
        let mut doc = self.ctx.document_mut();
        if !doc.contains(active.form) {
            return Ok(None);
        }
        let report = self.gate.evaluate(&FormSnapshot::capture(&*doc, active.form));
        if let Some(button) = active.save_button.filter(|b| doc.contains(*b)) {
            behaviors::apply_gate(&mut *doc, button, &report)?;
        }
        Ok(Some(report))
    }
}

/// Record id encoded in an update endpoint (`.../update/<id>/`)
fn active_record_id(action: &str) -> Option<RecordId> {
    let mut segments = action.split('/').filter(|s| !s.is_empty());
    segments
        .by_ref()
        .find(|s| *s == "update")
        .and_then(|_| segments.next())
        .and_then(RecordId::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_record_id() {
        assert_eq!(
            active_record_id("/client/update/42/").map(|id| id.to_string()),
            Some("42".to_string())
        );
        assert_eq!(active_record_id("/client/create/"), None);
    }
}
