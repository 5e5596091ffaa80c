//! Console facade
//!
//! [`Console`] is what a host page drives: it forwards clicks and field
//! events to the router, the modal controller, the submission pipeline and
//! the login overlay, which all share one [`ConsoleContext`].

pub mod context;

pub use context::ConsoleContext;

use crate::auth::{LoginOutcome, LoginOverlay};
use crate::config::ConsoleConfig;
use crate::core::entity::{EntityAction, EntityName, RecordId};
use crate::core::error::{ConsoleError, RoutingError};
use crate::core::events::EventBus;
use crate::core::validation::{FieldClassifier, SaveGateReport};
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};
use crate::http::Transport;
use crate::modal::password::{ToggleReport, toggle_visibility, wire_password_toggles};
use crate::modal::singleton::{ensure_singleton, hide_modal, image_modal_skeleton, show_modal};
use crate::modal::{ModalController, OpenOutcome};
use crate::page::Page;
use crate::router::EntityRouter;
use crate::submission::{SubmissionPipeline, SubmitOutcome, feedback};
use std::cell::{Ref, RefMut};
use std::rc::Rc;

/// A live edit event on a form control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Input,
    Change,
    Blur,
}

/// What a click turned into
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Not a console control
    Ignored,
    Opened(OpenOutcome),
    Submitted(SubmitOutcome),
    Deleted,
    Closed,
    PasswordToggled { visible: bool },
    ImagePreviewed,
    Login(LoginOutcome),
}

/// Which singleton a close control belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Entity,
    Login,
    Image,
}

pub struct Console {
    ctx: Rc<ConsoleContext>,
    modal: ModalController,
    submission: SubmissionPipeline,
    login: LoginOverlay,
}

impl Console {
    pub fn new(
        config: ConsoleConfig,
        document: impl Document + 'static,
        transport: Rc<dyn Transport>,
        page: Rc<dyn Page>,
    ) -> Self {
        let ctx = Rc::new(ConsoleContext::new(
            config,
            Box::new(document),
            transport,
            page,
        ));
        Self {
            modal: ModalController::new(ctx.clone()),
            submission: SubmissionPipeline::new(ctx.clone()),
            login: LoginOverlay::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &Rc<ConsoleContext> {
        &self.ctx
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.ctx.config
    }

    pub fn document(&self) -> Ref<'_, dyn Document + 'static> {
        self.ctx.document()
    }

    pub fn document_mut(&self) -> RefMut<'_, dyn Document + 'static> {
        self.ctx.document_mut()
    }

    pub fn events(&self) -> &EventBus {
        self.ctx.events()
    }

    pub fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub fn login(&self) -> &LoginOverlay {
        &self.login
    }

    /// Stamp inferred entity/id on every trigger below `root` and wire the
    /// password toggles already on the page
    pub fn prepare_page(&self, root: ElementId) -> Result<(usize, ToggleReport), ConsoleError> {
        let stamped = self.normalize_triggers(root)?;
        let toggles = wire_password_toggles(&mut *self.ctx.document_mut(), root)?;
        tracing::debug!(stamped, ?toggles, "page prepared");
        Ok((stamped, toggles))
    }

    pub fn normalize_triggers(&self, root: ElementId) -> Result<usize, ConsoleError> {
        Ok(EntityRouter::normalize_triggers(
            &mut *self.ctx.document_mut(),
            root,
        )?)
    }

    pub async fn open_create(&self, entity: &EntityName) -> Result<OpenOutcome, ConsoleError> {
        self.modal.open_create(entity).await
    }

    pub async fn open_edit(
        &self,
        entity: &EntityName,
        id: &RecordId,
    ) -> Result<OpenOutcome, ConsoleError> {
        self.modal.open_edit(entity, id).await
    }

    pub async fn delete(&self, entity: &EntityName, id: &RecordId) -> Result<(), ConsoleError> {
        self.submission.delete(entity, id).await
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, ConsoleError> {
        self.submission.submit(&self.modal).await
    }

    pub async fn submit_login(&self) -> Result<LoginOutcome, ConsoleError> {
        self.login.submit().await
    }

    pub fn close(&self) -> Result<(), ConsoleError> {
        self.modal.close()
    }

    /// Show `src` in the image preview modal
    pub fn preview_image(&self, src: &str) -> Result<ElementId, ConsoleError> {
        let selectors = &self.ctx.config.selectors;
        let mut doc = self.ctx.document_mut();
        let modal = ensure_singleton(
            &mut *doc,
            &selectors.image_modal_id,
            &image_modal_skeleton(selectors),
        )?;
        if let Some(img) = doc.find_first(modal, |d, el| d.has_class(el, "preview-image")) {
            doc.set_attribute(img, "src", src)?;
        }
        show_modal(&mut *doc, modal)?;
        tracing::debug!(%src, "image preview shown");
        Ok(modal)
    }

    /// Route a click on `el`
    ///
    /// Checked in order: password toggle, close control, bound save button,
    /// login submit, image preview, entity trigger.
    pub async fn handle_click(&self, el: ElementId) -> Result<ClickOutcome, ConsoleError> {
        if let Some(toggle) = self.password_toggle(el) {
            let visible = toggle_visibility(&mut *self.ctx.document_mut(), toggle)?;
            return Ok(ClickOutcome::PasswordToggled { visible });
        }

        if let Some((overlay, modal)) = self.close_control(el) {
            match overlay {
                Overlay::Entity => self.modal.close()?,
                Overlay::Login | Overlay::Image => {
                    hide_modal(&mut *self.ctx.document_mut(), modal)?
                }
            }
            return Ok(ClickOutcome::Closed);
        }

        if let Some(button) = self.save_button(el) {
            tracing::debug!(button = %button, "save clicked");
            return Ok(ClickOutcome::Submitted(self.submit().await?));
        }

        if self.is_login_submit(el) {
            return Ok(ClickOutcome::Login(self.submit_login().await?));
        }

        if let Some(src) = self.preview_source(el) {
            self.preview_image(&src)?;
            return Ok(ClickOutcome::ImagePreviewed);
        }

        let target = {
            let doc = self.ctx.document();
            match EntityRouter::trigger_for(&*doc, el) {
                Some(trigger) => EntityRouter::route(&*doc, trigger),
                None => return Ok(ClickOutcome::Ignored),
            }
        };
        let target = match target {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(element = %el, error = %e, "trigger could not be routed");
                return Err(e.into());
            }
        };

        tracing::debug!(entity = %target.entity, action = %target.action, "entity trigger clicked");
        match (target.action, target.id) {
            (EntityAction::Add, _) => Ok(ClickOutcome::Opened(
                self.open_create(&target.entity).await?,
            )),
            (EntityAction::Edit, Some(id)) => Ok(ClickOutcome::Opened(
                self.open_edit(&target.entity, &id).await?,
            )),
            (EntityAction::Delete, Some(id)) => {
                self.delete(&target.entity, &id).await?;
                Ok(ClickOutcome::Deleted)
            }
            (action, None) => Err(RoutingError::MissingId {
                entity: target.entity,
                action,
            }
            .into()),
        }
    }

    /// Apply live masking to `el` and refresh the Save-Gate
    ///
    /// Typing into a field also clears its invalid marking.
    pub fn handle_field_event(
        &self,
        el: ElementId,
        event: FieldEvent,
    ) -> Result<Option<SaveGateReport>, ConsoleError> {
        {
            let mut doc = self.ctx.document_mut();
            if !doc.contains(el) {
                return Err(DocumentError::Detached(el).into());
            }
            if let Some(mask) = FieldClassifier::mask(&*doc, el) {
                let raw = doc.value(el).unwrap_or_default().to_string();
                let masked = mask.apply(&raw);
                if masked != raw {
                    doc.set_value(el, &masked)?;
                }
            }
            if event == FieldEvent::Input {
                feedback::clear_invalid(&mut *doc, el, &self.ctx.config.selectors)?;
            }
        }

        let in_active_form = self.modal.active().is_some_and(|active| {
            let doc = self.ctx.document();
            doc.is_within(el, active.form)
        });
        if !in_active_form {
            return Ok(None);
        }
        self.modal.recompute_gate()
    }

    fn password_toggle(&self, el: ElementId) -> Option<ElementId> {
        let doc = self.ctx.document();
        doc.closest(el, |d, node| {
            d.has_class(node, "password-toggle") && d.has_attribute(node, "data-toggle-for")
        })
    }

    fn close_control(&self, el: ElementId) -> Option<(Overlay, ElementId)> {
        let doc = self.ctx.document();
        let control = doc.closest(el, |d, node| {
            d.attribute_is(node, "data-dismiss", "modal")
                || d.attribute_is(node, "data-bs-dismiss", "modal")
                || d.has_class(node, "btn-close")
        })?;
        let selectors = &self.ctx.config.selectors;
        [
            (Overlay::Entity, &selectors.entity_modal_id),
            (Overlay::Login, &selectors.login_modal_id),
            (Overlay::Image, &selectors.image_modal_id),
        ]
        .into_iter()
        .find_map(|(overlay, id)| {
            doc.element_by_id(id)
                .filter(|modal| doc.is_within(control, *modal))
                .map(|modal| (overlay, modal))
        })
    }

    fn save_button(&self, el: ElementId) -> Option<ElementId> {
        let candidate = {
            let doc = self.ctx.document();
            doc.closest(el, |d, node| d.is_tag(node, "button") || d.is_tag(node, "input"))
        }?;
        self.modal.is_save_button(candidate).then_some(candidate)
    }

    fn is_login_submit(&self, el: ElementId) -> bool {
        let doc = self.ctx.document();
        let Some(form) = doc.element_by_id(&self.ctx.config.selectors.login_form_id) else {
            return false;
        };
        doc.closest(el, |d, node| {
            (d.is_tag(node, "button") || d.is_tag(node, "input"))
                && d.attribute_is(node, "type", "submit")
        })
        .is_some_and(|button| doc.is_within(button, form))
    }

    fn preview_source(&self, el: ElementId) -> Option<String> {
        let doc = self.ctx.document();
        let trigger = doc.closest(el, |d, node| {
            d.has_attribute(node, "data-preview-src")
                || (d.is_tag(node, "img") && d.has_class(node, "preview-thumb"))
        })?;
        doc.attribute(trigger, "data-preview-src")
            .or_else(|| doc.attribute(trigger, "src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
