//! State shared by every console component

use crate::config::ConsoleConfig;
use crate::core::entity::EntityPaths;
use crate::core::events::{ConsoleEvent, EventBus};
use crate::dom::{Document, ElementId};
use crate::http::{HttpRequest, Transport, resolve_csrf_token};
use crate::page::Page;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Configuration plus the three seams (document, network, page) and the event bus
///
/// Components share one context through an `Rc`. The document sits in a
/// `RefCell`; borrows are never held across an `.await`.
pub struct ConsoleContext {
    pub config: ConsoleConfig,
    pub paths: EntityPaths,
    document: RefCell<Box<dyn Document>>,
    transport: Rc<dyn Transport>,
    page: Rc<dyn Page>,
    events: EventBus,
}

impl ConsoleContext {
    pub fn new(
        config: ConsoleConfig,
        document: Box<dyn Document>,
        transport: Rc<dyn Transport>,
        page: Rc<dyn Page>,
    ) -> Self {
        Self {
            paths: EntityPaths::new(config.base_path.clone()),
            config,
            document: RefCell::new(document),
            transport,
            page,
            events: EventBus::default(),
        }
    }

    pub fn document(&self) -> Ref<'_, dyn Document + 'static> {
        Ref::map(self.document.borrow(), |d| &**d)
    }

    pub fn document_mut(&self) -> RefMut<'_, dyn Document + 'static> {
        RefMut::map(self.document.borrow_mut(), |d| &mut **d)
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn page(&self) -> &dyn Page {
        self.page.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn publish(&self, event: ConsoleEvent) {
        self.events.publish(event);
    }

    /// Add the background-request marker header
    pub fn ajax(&self, request: HttpRequest) -> HttpRequest {
        let header = &self.config.ajax_header;
        request.with_header(header.name.clone(), header.value.clone())
    }

    /// Add the ajax marker and, when one can be found, the CSRF header
    pub fn state_changing(&self, request: HttpRequest, scope: Option<ElementId>) -> HttpRequest {
        let token = {
            let doc = self.document();
            resolve_csrf_token(&*doc, scope, self.page(), &self.config.csrf)
        };
        let request = self.ajax(request);
        match token {
            Some(token) => request.with_header(self.config.csrf.header_name.clone(), token),
            None => {
                tracing::warn!(path = %request.path, "no CSRF token found for request");
                request
            }
        }
    }
}
