//! Field value filters
//!
//! Filters rewrite a captured value. They run in two places: when a form
//! fragment is installed (display filters) and when a copy of the form is
//! serialized for sending (transmission filters). Neither ever fails; a
//! value a filter does not understand passes through unchanged.

use super::classifier::FieldSnapshot;
use crate::core::date::{display_to_iso, iso_to_display};
use crate::core::field::FieldCategory;

/// Boxed filter as returned by [`display_filters`] and [`transmission_filters`]
pub type Filter = Box<dyn Fn(&FieldSnapshot, String) -> String>;

/// Filter: date fields holding `yyyy-mm-dd` are shown as `dd/mm/yyyy`
pub fn iso_dates_to_display() -> impl Fn(&FieldSnapshot, String) -> String + Clone {
    |field: &FieldSnapshot, value: String| {
        if field.category != FieldCategory::Date {
            return value;
        }
        iso_to_display(value.trim()).unwrap_or(value)
    }
}

/// Filter: date fields holding `dd/mm/yyyy` are sent as `yyyy-mm-dd`
pub fn display_dates_to_iso() -> impl Fn(&FieldSnapshot, String) -> String + Clone {
    |field: &FieldSnapshot, value: String| {
        if field.category != FieldCategory::Date {
            return value;
        }
        display_to_iso(value.trim()).unwrap_or(value)
    }
}

/// Filter: apply the field's input mask, if it has one
pub fn masked() -> impl Fn(&FieldSnapshot, String) -> String + Clone {
    |field: &FieldSnapshot, value: String| match field.mask {
        Some(mask) if !value.is_empty() => mask.apply(&value),
        _ => value,
    }
}

/// Filters run over every field right after a fragment is installed
pub fn display_filters() -> Vec<Filter> {
    vec![Box::new(iso_dates_to_display()), Box::new(masked())]
}

/// Filters run over the serialized copy of a form
pub fn transmission_filters() -> Vec<Filter> {
    vec![Box::new(display_dates_to_iso())]
}

/// Run `filters` in order over the field's current value
pub fn apply(filters: &[Filter], field: &FieldSnapshot) -> String {
    filters
        .iter()
        .fold(field.value.clone(), |value, filter| filter(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::MaskKind;
    use crate::dom::ElementId;

    fn field(category: FieldCategory, mask: Option<MaskKind>, value: &str) -> FieldSnapshot {
        FieldSnapshot {
            element: ElementId(1),
            name: "f".to_string(),
            input_type: "text".to_string(),
            value: value.to_string(),
            checked: false,
            visible: true,
            disabled: false,
            required: false,
            optional: false,
            category,
            mask,
        }
    }

    #[test]
    fn test_iso_dates_to_display() {
        let f = iso_dates_to_display();
        let date = field(FieldCategory::Date, None, "");
        assert_eq!(f(&date, "2024-02-29".to_string()), "29/02/2024");
        assert_eq!(f(&date, "29/02/2024".to_string()), "29/02/2024");
        let text = field(FieldCategory::PlainText, None, "");
        assert_eq!(f(&text, "2024-02-29".to_string()), "2024-02-29");
    }

    #[test]
    fn test_display_dates_to_iso_leaves_invalid_alone() {
        let f = display_dates_to_iso();
        let date = field(FieldCategory::Date, None, "");
        assert_eq!(f(&date, "01/12/2023".to_string()), "2023-12-01");
        assert_eq!(f(&date, "31/02/2023".to_string()), "31/02/2023");
        assert_eq!(f(&date, String::new()), "");
    }

    #[test]
    fn test_masked() {
        let f = masked();
        let phone = field(FieldCategory::PlainText, Some(MaskKind::Phone), "");
        assert_eq!(f(&phone, "98765 43210 1".to_string()), "9876543210");
        let plain = field(FieldCategory::PlainText, None, "");
        assert_eq!(f(&plain, "98765 43210".to_string()), "98765 43210");
    }

    #[test]
    fn test_apply_chains_display_filters() {
        let id = field(
            FieldCategory::NationalId,
            Some(MaskKind::NationalId),
            "123456789012",
        );
        assert_eq!(apply(&display_filters(), &id), "1234 5678 9012");
        let date = field(FieldCategory::Date, None, "2020-01-05");
        assert_eq!(apply(&display_filters(), &date), "05/01/2020");
        assert_eq!(apply(&transmission_filters(), &field(FieldCategory::Date, None, "05/01/2020")), "2020-01-05");
    }
}
