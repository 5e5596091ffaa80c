//! Inline error display inside the entity modal

use crate::config::SelectorConfig;
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};

/// The shared error panel for `form`, created right before the form if missing
pub fn error_panel<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
    selectors: &SelectorConfig,
) -> Result<ElementId, DocumentError> {
    let parent = doc.parent(form).ok_or(DocumentError::Detached(form))?;
    let existing = doc
        .find_first(parent, |d, el| d.has_class(el, &selectors.error_panel_class))
        .filter(|panel| doc.parent(*panel) == Some(parent) || doc.is_within(*panel, form));
    if let Some(panel) = existing {
        return Ok(panel);
    }
    let panel = doc.create_element("div", parent, Some(form))?;
    doc.set_attribute(
        panel,
        "class",
        &format!("{} alert alert-danger", selectors.error_panel_class),
    )?;
    doc.set_attribute(panel, "role", "alert")?;
    doc.set_displayed(panel, false)?;
    Ok(panel)
}

/// Replace the panel's content with `messages` and show it
pub fn show_messages<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
    messages: &[String],
    selectors: &SelectorConfig,
) -> Result<ElementId, DocumentError> {
    let panel = error_panel(doc, form, selectors)?;
    doc.clear_children(panel)?;
    let list = doc.create_element("ul", panel, None)?;
    doc.set_attribute(list, "class", "mb-0")?;
    for message in messages {
        let item = doc.create_element("li", list, None)?;
        doc.set_text(item, message)?;
    }
    doc.set_displayed(panel, true)?;
    Ok(panel)
}

/// Mark one control as offending
pub fn mark_invalid<D: Document + ?Sized>(
    doc: &mut D,
    el: ElementId,
    selectors: &SelectorConfig,
) -> Result<(), DocumentError> {
    doc.add_class(el, &selectors.invalid_class)?;
    doc.stamp_attribute(el, "aria-invalid", "true")?;
    Ok(())
}

/// Mark every control of `form` named `name`; returns them in document order
pub fn mark_invalid_by_name<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
    name: &str,
    selectors: &SelectorConfig,
) -> Result<Vec<ElementId>, DocumentError> {
    let fields = doc.find_all(form, |d, el| d.is_control(el) && d.attribute_is(el, "name", name));
    for field in &fields {
        mark_invalid(doc, *field, selectors)?;
    }
    Ok(fields)
}

pub fn clear_invalid<D: Document + ?Sized>(
    doc: &mut D,
    el: ElementId,
    selectors: &SelectorConfig,
) -> Result<(), DocumentError> {
    doc.remove_class(el, &selectors.invalid_class)?;
    doc.remove_attribute(el, "aria-invalid")?;
    Ok(())
}

/// Hide the panel and unmark every control of `form`
pub fn clear<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
    selectors: &SelectorConfig,
) -> Result<(), DocumentError> {
    let marked = doc.find_all(form, |d, el| {
        d.has_class(el, &selectors.invalid_class) || d.has_attribute(el, "aria-invalid")
    });
    for el in marked {
        clear_invalid(doc, el, selectors)?;
    }
    if let Some(parent) = doc.parent(form) {
        let panels = doc.find_all(parent, |d, el| d.has_class(el, &selectors.error_panel_class));
        for panel in panels {
            doc.clear_children(panel)?;
            doc.set_displayed(panel, false)?;
        }
    }
    Ok(())
}
