//! Field classification and form snapshots
//!
//! Validation and save-gating never read the document directly: they work
//! on a [`FormSnapshot`] captured in one pass, so every rule sees the same
//! state.

use crate::core::field::{FieldCategory, MaskKind};
use crate::dom::{Document, DocumentExt, ElementId};

const NATIONAL_ID_NAMES: &[&str] = &["adharno", "aadhar", "aadhaar"];
const PHONE_NAMES: &[&str] = &["phone", "mobile", "contact1", "housecontactno"];
const SKIPPED_INPUT_TYPES: &[&str] = &["submit", "reset", "button", "image", "file"];

/// One control as seen at capture time
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub element: ElementId,
    pub name: String,
    /// `text`, `email`, `checkbox`, ..., `select`, `textarea`
    pub input_type: String,
    pub value: String,
    pub checked: bool,
    pub visible: bool,
    pub disabled: bool,
    pub required: bool,
    pub optional: bool,
    pub category: FieldCategory,
    pub mask: Option<MaskKind>,
}

impl FieldSnapshot {
    /// Visible, enabled and not explicitly optional
    pub fn participates(&self) -> bool {
        self.visible && !self.disabled && !self.optional
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Every named control of one form, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub form: ElementId,
    pub fields: Vec<FieldSnapshot>,
}

impl FormSnapshot {
    /// Capture the current state of every named control below `form`
    pub fn capture<D: Document + ?Sized>(doc: &D, form: ElementId) -> Self {
        let fields = doc
            .descendants(form)
            .into_iter()
            .filter_map(|el| FieldClassifier::snapshot(doc, el))
            .collect();
        Self { form, fields }
    }

    /// True if any checkbox/radio named `name` is checked
    pub fn is_group_checked(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.category == FieldCategory::GroupedChoice && f.name == name && f.checked)
    }

    /// Whether a field counts as filled: grouped choices by group, others by value
    pub fn is_satisfied(&self, field: &FieldSnapshot) -> bool {
        match field.category {
            FieldCategory::GroupedChoice => self.is_group_checked(&field.name),
            _ => !field.is_blank(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_element(&self, el: ElementId) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|f| f.element == el)
    }
}

/// Decides visibility, required-ness, category and mask of a control
pub struct FieldClassifier;

impl FieldClassifier {
    /// Snapshot one element, or `None` when it is not a named data control
    pub fn snapshot<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<FieldSnapshot> {
        let input_type = doc.input_type(el)?;
        if SKIPPED_INPUT_TYPES.contains(&input_type.as_str()) {
            return None;
        }
        let name = doc.attribute(el, "name")?.trim().to_string();
        if name.is_empty() {
            return None;
        }

        Some(FieldSnapshot {
            element: el,
            value: doc.value(el).unwrap_or_default().to_string(),
            checked: doc.is_checked(el),
            visible: Self::is_visible(doc, el),
            disabled: doc.is_disabled(el),
            required: Self::is_required(doc, el),
            optional: Self::is_optional(doc, el),
            category: Self::category(doc, el),
            mask: Self::mask(doc, el),
            input_type,
            name,
        })
    }

    /// A control is visible when it participates in layout
    pub fn is_visible<D: Document + ?Sized>(doc: &D, el: ElementId) -> bool {
        doc.input_type(el).as_deref() != Some("hidden") && doc.is_displayed(el)
    }

    /// `required`, `data-required` or `aria-required="true"`; any one suffices
    pub fn is_required<D: Document + ?Sized>(doc: &D, el: ElementId) -> bool {
        doc.has_attribute(el, "required")
            || flag(doc.attribute(el, "data-required"))
            || doc.attribute_is(el, "aria-required", "true")
    }

    pub fn is_optional<D: Document + ?Sized>(doc: &D, el: ElementId) -> bool {
        flag(doc.attribute(el, "data-optional"))
    }

    pub fn category<D: Document + ?Sized>(doc: &D, el: ElementId) -> FieldCategory {
        let input_type = doc.input_type(el).unwrap_or_default();
        let name = doc
            .attribute(el, "name")
            .unwrap_or_default()
            .to_ascii_lowercase();

        if matches!(input_type.as_str(), "checkbox" | "radio") {
            FieldCategory::GroupedChoice
        } else if input_type == "email" || name.contains("email") {
            FieldCategory::Email
        } else if doc.has_class(el, "date-field")
            || doc.attribute_is(el, "data-flatpickr", "true")
            || name.contains("date")
            || name == "dob"
        {
            FieldCategory::Date
        } else if doc.has_class(el, "aadhar-input") || NATIONAL_ID_NAMES.contains(&name.as_str()) {
            FieldCategory::NationalId
        } else {
            FieldCategory::PlainText
        }
    }

    pub fn mask<D: Document + ?Sized>(doc: &D, el: ElementId) -> Option<MaskKind> {
        let name = doc
            .attribute(el, "name")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if doc.has_class(el, "aadhar-input") || NATIONAL_ID_NAMES.contains(&name.as_str()) {
            Some(MaskKind::NationalId)
        } else if doc.has_class(el, "phone-input") || PHONE_NAMES.contains(&name.as_str()) {
            Some(MaskKind::Phone)
        } else {
            None
        }
    }
}

/// Boolean-ish data attribute: present and not `false`/`0`
fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn form(markup: &str) -> (MemoryDocument, FormSnapshot) {
        let doc = MemoryDocument::from_markup(&format!("<form id=\"f\">{}</form>", markup)).unwrap();
        let form = doc.element_by_id("f").unwrap();
        let snapshot = FormSnapshot::capture(&doc, form);
        (doc, snapshot)
    }

    #[test]
    fn test_categories() {
        let (_, snap) = form(
            r#"<input name="name">
               <input name="contact_email">
               <input type="email" name="mail">
               <input name="joining_date" class="date-field form-control">
               <input name="dob">
               <input name="aadhar">
               <input name="perm" type="checkbox">
               <input name="kind" type="radio">
               <select name="branch"><option value="1">A</option></select>"#,
        );
        let cats: Vec<FieldCategory> = snap.fields.iter().map(|f| f.category).collect();
        assert_eq!(
            cats,
            vec![
                FieldCategory::PlainText,
                FieldCategory::Email,
                FieldCategory::Email,
                FieldCategory::Date,
                FieldCategory::Date,
                FieldCategory::NationalId,
                FieldCategory::GroupedChoice,
                FieldCategory::GroupedChoice,
                FieldCategory::PlainText,
            ]
        );
    }

    #[test]
    fn test_required_markers() {
        let (_, snap) = form(
            r#"<input name="a" required>
               <input name="b" data-required="true">
               <input name="c" aria-required="true">
               <input name="d" data-required="false">
               <input name="e">"#,
        );
        let required: Vec<bool> = snap.fields.iter().map(|f| f.required).collect();
        assert_eq!(required, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_buttons_and_unnamed_controls_are_skipped() {
        let (_, snap) = form(
            r#"<input type="submit" name="go"><input name=""><input type="file" name="photo">
               <input name="kept"><button name="b">Save</button>"#,
        );
        assert_eq!(snap.fields.len(), 1);
        assert_eq!(snap.fields[0].name, "kept");
    }

    #[test]
    fn test_visibility_and_participation() {
        let (_, snap) = form(
            r#"<input type="hidden" name="csrfmiddlewaretoken" value="t">
               <div style="display:none"><input name="collapsed" required></div>
               <input name="off" disabled>
               <input name="skip" data-optional="true">
               <input name="live">"#,
        );
        let participating: Vec<&str> = snap
            .fields
            .iter()
            .filter(|f| f.participates())
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(participating, vec!["live"]);
    }

    #[test]
    fn test_group_checked_counts_any_member() {
        let (mut doc, snap) = form(
            r#"<input id="a" type="checkbox" name="perm" value="A">
               <input id="b" type="checkbox" name="perm" value="B" checked>"#,
        );
        assert!(snap.is_group_checked("perm"));
        let b = doc.element_by_id("b").unwrap();
        doc.set_checked(b, false).unwrap();
        let snap = FormSnapshot::capture(&doc, snap.form);
        assert!(!snap.is_group_checked("perm"));
    }

    #[test]
    fn test_masks() {
        let (_, snap) = form(
            r#"<input name="mobile"><input name="x" class="form-control phone-input">
               <input name="adharno"><input name="plain">"#,
        );
        let masks: Vec<Option<MaskKind>> = snap.fields.iter().map(|f| f.mask).collect();
        assert_eq!(
            masks,
            vec![
                Some(MaskKind::Phone),
                Some(MaskKind::Phone),
                Some(MaskKind::NationalId),
                None
            ]
        );
    }
}
