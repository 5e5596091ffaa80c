//! Password visibility toggles
//!
//! Every real password field gets exactly one toggle,
//! `button.password-toggle[data-toggle-for=<field id>]`, marked
//! `data-toggle-canonical="true"`. Decoy fields (anti-autofill traps) get
//! none. The pass is idempotent: on an unchanged document a second run
//! creates and removes nothing.

use crate::dom::{Document, DocumentError, DocumentExt, ElementId};

const TOGGLE_CLASS: &str = "password-toggle";
const FOREIGN_TOGGLE_CLASSES: &[&str] = &["password-toggle", "toggle-password"];
const CANONICAL: &str = "data-toggle-canonical";
const MANUAL: &str = "data-manual-toggle";
const TARGET: &str = "data-toggle-for";
const DECOY_NAMES: &[&str] = &["current-password"];

/// What a wiring pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleReport {
    pub created: usize,
    pub removed: usize,
    pub skipped_decoys: usize,
}

impl ToggleReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0
    }
}

/// A password field the user cannot see or is not meant to use
pub fn is_decoy<D: Document + ?Sized>(doc: &D, field: ElementId) -> bool {
    let layout = doc.layout(field);
    if !layout.displayed || layout.rect.is_negligible() || layout.rect.is_outside(&doc.viewport()) {
        return true;
    }
    if doc.has_attribute(field, "hidden") || doc.attribute_is(field, "aria-hidden", "true") {
        return true;
    }
    ["name", "id", "autocomplete"].iter().any(|attr| {
        doc.attribute(field, attr)
            .is_some_and(|v| DECOY_NAMES.contains(&v.trim()))
    })
}

/// Password fields below `root`, including ones currently shown as text
fn password_fields<D: Document + ?Sized>(doc: &D, root: ElementId) -> Vec<ElementId> {
    doc.find_all(root, |d, el| {
        d.is_tag(el, "input")
            && (d.input_type(el).as_deref() == Some("password")
                || d.attribute_is(el, "data-password-field", "true"))
    })
}

fn is_toggle<D: Document + ?Sized>(doc: &D, el: ElementId) -> bool {
    FOREIGN_TOGGLE_CLASSES.iter().any(|c| doc.has_class(el, c))
}

/// Give `field` an id if it has none (`id_<name>`, made unique)
fn ensure_field_id<D: Document + ?Sized>(
    doc: &mut D,
    field: ElementId,
) -> Result<String, DocumentError> {
    if let Some(id) = doc.attribute(field, "id").filter(|id| !id.trim().is_empty()) {
        return Ok(id.to_string());
    }
    let name = doc.attribute(field, "name").unwrap_or("password").to_string();
    let base = format!("id_{}", name);
    let mut candidate = base.clone();
    let mut n = 2;
    while doc.element_by_id(&candidate).is_some_and(|el| el != field) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    doc.set_attribute(field, "id", &candidate)?;
    Ok(candidate)
}

/// Toggles for `field_id` anywhere in the document, plus untargeted toggles
/// sitting next to the field
fn toggles_for<D: Document + ?Sized>(doc: &D, field: ElementId, field_id: &str) -> Vec<ElementId> {
    let mut toggles = doc.find_all(doc.root(), |d, el| {
        is_toggle(d, el) && d.attribute_is(el, TARGET, field_id)
    });
    if let Some(parent) = doc.parent(field) {
        for sibling in doc.children(parent) {
            if sibling != field
                && is_toggle(doc, sibling)
                && !doc.has_attribute(sibling, TARGET)
                && !toggles.contains(&sibling)
            {
                toggles.push(sibling);
            }
        }
    }
    toggles
}

/// Wire exactly one toggle per real password field below `root`
pub fn wire_password_toggles<D: Document + ?Sized>(
    doc: &mut D,
    root: ElementId,
) -> Result<ToggleReport, DocumentError> {
    let mut report = ToggleReport::default();

    for field in password_fields(doc, root) {
        if is_decoy(doc, field) {
            report.skipped_decoys += 1;
            if let Some(id) = doc.attribute(field, "id").map(str::to_string) {
                for toggle in toggles_for(doc, field, &id) {
                    doc.remove_element(toggle)?;
                    report.removed += 1;
                }
            }
            continue;
        }

        let field_id = ensure_field_id(doc, field)?;
        doc.stamp_attribute(field, "data-password-field", "true")?;
        let toggles = toggles_for(doc, field, &field_id);

        let survivor = toggles
            .iter()
            .copied()
            .find(|t| doc.attribute_is(*t, CANONICAL, "true"))
            .or_else(|| toggles.iter().copied().find(|t| doc.has_attribute(*t, MANUAL)))
            .or_else(|| toggles.first().copied());

        let survivor = match survivor {
            Some(toggle) => toggle,
            None => {
                report.created += 1;
                create_toggle(doc, field)?
            }
        };
        for toggle in toggles.into_iter().filter(|t| *t != survivor) {
            doc.remove_element(toggle)?;
            report.removed += 1;
        }

        doc.add_class(survivor, TOGGLE_CLASS)?;
        doc.stamp_attribute(survivor, TARGET, &field_id)?;
        doc.stamp_attribute(survivor, CANONICAL, "true")?;
    }

    // Toggles whose field is gone
    let orphans = doc.find_all(root, |d, el| {
        d.is_tag(el, "button")
            && d.has_class(el, TOGGLE_CLASS)
            && d.attribute(el, TARGET)
                .is_some_and(|target| d.element_by_id(target).is_none())
    });
    for orphan in orphans {
        doc.remove_element(orphan)?;
        report.removed += 1;
    }

    if !report.is_noop() {
        tracing::debug!(
            created = report.created,
            removed = report.removed,
            skipped_decoys = report.skipped_decoys,
            "password toggles wired"
        );
    }
    Ok(report)
}

fn create_toggle<D: Document + ?Sized>(
    doc: &mut D,
    field: ElementId,
) -> Result<ElementId, DocumentError> {
    let parent = doc.parent(field).ok_or(DocumentError::Detached(field))?;
    let siblings = doc.children(parent);
    let next = siblings
        .iter()
        .position(|s| *s == field)
        .and_then(|i| siblings.get(i + 1).copied());

    let toggle = doc.create_element("button", parent, next)?;
    doc.set_attribute(toggle, "type", "button")?;
    doc.set_attribute(toggle, "class", TOGGLE_CLASS)?;
    doc.set_attribute(toggle, "aria-label", "Show password")?;
    doc.set_attribute(toggle, "aria-pressed", "false")?;
    doc.set_text(toggle, "Show")?;
    Ok(toggle)
}

/// Flip the toggle's field between hidden and shown; returns whether the
/// password is now visible
pub fn toggle_visibility<D: Document + ?Sized>(
    doc: &mut D,
    toggle: ElementId,
) -> Result<bool, DocumentError> {
    let field = doc
        .attribute(toggle, TARGET)
        .and_then(|id| doc.element_by_id(id))
        .ok_or(DocumentError::UnknownElement(toggle))?;

    let visible = doc.input_type(field).as_deref() == Some("password");
    doc.set_attribute(field, "type", if visible { "text" } else { "password" })?;
    doc.set_attribute(toggle, "aria-pressed", if visible { "true" } else { "false" })?;
    doc.set_attribute(
        toggle,
        "aria-label",
        if visible { "Hide password" } else { "Show password" },
    )?;
    doc.set_text(toggle, if visible { "Hide" } else { "Show" })?;
    Ok(visible)
}
