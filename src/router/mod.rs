//! Entity Router: infers what a clicked element asks for
//!
//! Entity resolution, first match wins:
//! 1. `data-entity` on the element
//! 2. the element id `create-<entity>-btn`
//! 3. a link target `/<entity>/(get|create|update|delete)[/<id>]/`
//! 4. the nearest ancestor carrying `data-entity`
//!
//! Record id resolution, first match wins:
//! 1. `data-id` on the element
//! 2. the nearest ancestor carrying `data-id`
//! 3. the trailing segment of a `get|update|delete` link
//!
//! A leading `:` on any id is stripped. Text content is never used.

use crate::core::entity::{EntityAction, EntityName, EntityTarget, RecordId};
use crate::core::error::RoutingError;
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};
use regex::Regex;
use std::sync::OnceLock;

/// What a link target says about an entity operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub entity: EntityName,
    pub verb: String,
    pub id: Option<RecordId>,
}

impl LinkTarget {
    /// Parse `.../<entity>/<verb>/[<id>/]`; query and fragment are ignored
    pub fn parse(href: &str) -> Option<Self> {
        static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = LINK_REGEX.get_or_init(|| {
            Regex::new(r"/([^/?#]+)/(get|create|update|delete)(?:/([^/?#]*))?/?(?:[?#].*)?$")
                .expect("link regex is valid")
        });
        let caps = regex.captures(href.trim())?;
        Some(Self {
            entity: EntityName::parse(caps.get(1)?.as_str())?,
            verb: caps.get(2)?.as_str().to_string(),
            id: caps.get(3).and_then(|m| RecordId::parse(m.as_str())),
        })
    }

    /// `get` with an id edits, without one it creates
    pub fn action(&self) -> EntityAction {
        match self.verb.as_str() {
            "create" => EntityAction::Add,
            "delete" => EntityAction::Delete,
            "get" if self.id.is_none() => EntityAction::Add,
            _ => EntityAction::Edit,
        }
    }
}

/// Stateless resolver over any [`Document`]
pub struct EntityRouter;

impl EntityRouter {
    /// Resolve a trigger into a target, refusing edit/delete without an id
    pub fn route<D: Document + ?Sized>(
        doc: &D,
        el: ElementId,
    ) -> Result<EntityTarget, RoutingError> {
        let action = Self::action(doc, el).ok_or(RoutingError::NoAction)?;
        let entity = Self::entity(doc, el).ok_or(RoutingError::NoEntity)?;
        let id = match action {
            EntityAction::Add => None,
            _ => Some(
                Self::record_id(doc, el).ok_or_else(|| RoutingError::MissingId {
                    entity: entity.clone(),
                    action,
                })?,
            ),
        };
        tracing::debug!(%entity, action = %action, id = ?id, element = %el, "trigger resolved");
        Ok(EntityTarget { entity, id, action })
    }

    /// Nearest inclusive ancestor of `el` that is an entity trigger
    pub fn trigger_for<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<ElementId> {
        doc.closest(el, |d, node| Self::action(d, node).is_some())
    }

    pub fn entity<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<EntityName> {
        doc.attribute(el, "data-entity")
            .and_then(EntityName::parse)
            .or_else(|| Self::entity_from_element_id(doc, el))
            .or_else(|| Self::link(doc, el).map(|link| link.entity))
            .or_else(|| {
                doc.parent(el)
                    .and_then(|p| doc.closest(p, |d, node| d.has_attribute(node, "data-entity")))
                    .and_then(|a| doc.attribute(a, "data-entity"))
                    .and_then(EntityName::parse)
            })
    }

    pub fn record_id<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<RecordId> {
        doc.attribute(el, "data-id")
            .and_then(RecordId::parse)
            .or_else(|| {
                doc.parent(el)
                    .and_then(|p| doc.closest(p, |d, node| d.has_attribute(node, "data-id")))
                    .and_then(|a| doc.attribute(a, "data-id"))
                    .and_then(RecordId::parse)
            })
            .or_else(|| {
                Self::link(doc, el)
                    .filter(|link| link.verb != "create")
                    .and_then(|link| link.id)
            })
    }

    pub fn action<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<EntityAction> {
        if let Some(action) = doc.attribute(el, "data-action").and_then(EntityAction::parse) {
            return Some(action);
        }
        if Self::entity_from_element_id(doc, el).is_some() {
            return Some(EntityAction::Add);
        }
        if doc.has_class(el, "add-btn") {
            return Some(EntityAction::Add);
        }
        if doc.has_class(el, "edit-btn") {
            return Some(EntityAction::Edit);
        }
        if doc.has_class(el, "delete-btn") {
            return Some(EntityAction::Delete);
        }
        Self::link(doc, el).map(|link| link.action())
    }

    /// Stamp inferred entity, id and action onto every trigger below `root`
    ///
    /// Returns how many elements changed; a second pass returns 0.
    pub fn normalize_triggers<D: Document + ?Sized>(
        doc: &mut D,
        root: ElementId,
    ) -> Result<usize, DocumentError> {
        let triggers = doc.find_all(root, |d, el| Self::action(d, el).is_some());
        let mut changed = 0;
        for el in triggers {
            let Ok(target) = Self::route(doc, el) else {
                continue;
            };
            let mut touched = doc.stamp_attribute(el, "data-entity", target.entity.as_str())?;
            touched |= doc.stamp_attribute(el, "data-action", target.action.as_str())?;
            if let Some(id) = &target.id {
                touched |= doc.stamp_attribute(el, "data-id", id.as_str())?;
            }
            if touched {
                changed += 1;
            }
        }
        if changed > 0 {
            tracing::debug!(changed, "entity triggers normalized");
        }
        Ok(changed)
    }

    fn entity_from_element_id<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<EntityName> {
        let id = doc.attribute(el, "id")?;
        let name = id.strip_prefix("create-")?.strip_suffix("-btn")?;
        EntityName::parse(name)
    }

    fn link<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<LinkTarget> {
        doc.attribute(el, "href").and_then(LinkTarget::parse)
    }
}
