//! Post-injection attachment sequence
//!
//! Runs after every fragment install (open or re-render). Each step is
//! idempotent, so running the sequence twice over the same form changes
//! nothing the second time. Date prefill is the exception to "every
//! install": callers ask for it only when a create form is first opened.

use super::password::{ToggleReport, wire_password_toggles};
use crate::core::date::format_display;
use crate::core::field::FieldCategory;
use crate::core::validation::filters::{apply, display_filters};
use crate::core::validation::{FormSnapshot, SaveGateReport};
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};
use chrono::NaiveDate;
use indexmap::IndexMap;

const CHOICE_GROUP_CLASS: &str = "choice-group";

/// What [`attach`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    pub reformatted: usize,
    pub prefilled: usize,
    pub grouped: usize,
    pub toggles: ToggleReport,
}

/// Format values, prefill dates, group choices and wire password toggles
///
/// `modal` bounds the toggle pass; `form` bounds everything else. Empty date
/// fields are filled only when `prefill` carries a date.
pub fn attach<D: Document + ?Sized>(
    doc: &mut D,
    modal: ElementId,
    form: ElementId,
    prefill: Option<NaiveDate>,
) -> Result<AttachReport, DocumentError> {
    let reformatted = format_fields(doc, form)?;
    let prefilled = match prefill {
        Some(today) => prefill_dates(doc, form, today)?,
        None => 0,
    };
    let grouped = group_choices(doc, form)?;
    let toggles = wire_password_toggles(doc, modal)?;
    Ok(AttachReport {
        reformatted,
        prefilled,
        grouped,
        toggles,
    })
}

/// ISO dates shown as dd/mm/yyyy; masks applied to existing values
pub fn format_fields<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
) -> Result<usize, DocumentError> {
    let filters = display_filters();
    let snapshot = FormSnapshot::capture(doc, form);
    let mut changed = 0;
    for field in &snapshot.fields {
        if field.category == FieldCategory::GroupedChoice {
            continue;
        }
        let formatted = apply(&filters, field);
        if formatted != field.value {
            doc.set_value(field.element, &formatted)?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Empty visible date fields get today's date (create mode only)
pub fn prefill_dates<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
    today: NaiveDate,
) -> Result<usize, DocumentError> {
    let display = format_display(today);
    let snapshot = FormSnapshot::capture(doc, form);
    let mut filled = 0;
    for field in snapshot
        .fields
        .iter()
        .filter(|f| f.category == FieldCategory::Date && f.participates() && f.is_blank())
    {
        doc.set_value(field.element, &display)?;
        filled += 1;
    }
    Ok(filled)
}

/// Wrap checkbox/radio members sharing a name in one
/// `div.choice-group[data-group=<name>]`
///
/// A member wrapped in a `<label>` moves with its label; a sibling
/// `label[for=<id>]` moves right after its member.
pub fn group_choices<D: Document + ?Sized>(
    doc: &mut D,
    form: ElementId,
) -> Result<usize, DocumentError> {
    let snapshot = FormSnapshot::capture(doc, form);
    let mut groups: IndexMap<String, Vec<ElementId>> = IndexMap::new();
    for field in snapshot
        .fields
        .iter()
        .filter(|f| f.category == FieldCategory::GroupedChoice)
    {
        groups
            .entry(field.name.clone())
            .or_default()
            .push(field.element);
    }

    let mut wrapped = 0;
    for (name, members) in groups {
        if members.len() < 2 || already_grouped(doc, &name, &members) {
            continue;
        }

        let mut units: Vec<ElementId> = Vec::new();
        for member in &members {
            let unit = match doc.parent(*member) {
                Some(parent) if doc.is_tag(parent, "label") => parent,
                _ => *member,
            };
            if !units.contains(&unit) {
                units.push(unit);
            }
            if unit == *member {
                if let Some(label) = sibling_label(doc, *member) {
                    if !units.contains(&label) {
                        units.push(label);
                    }
                }
            }
        }

        let first = units[0];
        let parent = doc.parent(first).ok_or(DocumentError::Detached(first))?;
        let wrapper = doc.create_element("div", parent, Some(first))?;
        doc.set_attribute(wrapper, "class", CHOICE_GROUP_CLASS)?;
        doc.set_attribute(wrapper, "data-group", &name)?;
        for unit in units {
            doc.move_element(unit, wrapper, None)?;
        }
        wrapped += 1;
    }
    Ok(wrapped)
}

fn already_grouped<D: Document + ?Sized>(doc: &D, name: &str, members: &[ElementId]) -> bool {
    let wrapper_of = |el: ElementId| {
        doc.closest(el, |d, node| {
            d.has_class(node, CHOICE_GROUP_CLASS) && d.attribute_is(node, "data-group", name)
        })
    };
    let first = wrapper_of(members[0]);
    first.is_some() && members.iter().all(|m| wrapper_of(*m) == first)
}

fn sibling_label<D: Document + ?Sized>(doc: &D, member: ElementId) -> Option<ElementId> {
    let id = doc.attribute(member, "id")?;
    let parent = doc.parent(member)?;
    doc.children(parent)
        .into_iter()
        .find(|el| doc.is_tag(*el, "label") && doc.attribute_is(*el, "for", id))
}

/// Reflect the gate on the save control's `disabled` attribute
pub fn apply_gate<D: Document + ?Sized>(
    doc: &mut D,
    save_button: ElementId,
    report: &SaveGateReport,
) -> Result<(), DocumentError> {
    if report.eligible {
        doc.remove_attribute(save_button, "disabled")?;
        doc.stamp_attribute(save_button, "aria-disabled", "false")?;
    } else {
        doc.stamp_attribute(save_button, "disabled", "")?;
        doc.stamp_attribute(save_button, "aria-disabled", "true")?;
    }
    Ok(())
}
