//! Form serialization for transmission

use crate::core::field::FieldCategory;
use crate::core::validation::FormSnapshot;
use crate::core::validation::filters::{apply, transmission_filters};
use crate::dom::{Document, ElementId};

/// Name/value pairs a browser would send for `form`, with dates re-encoded
/// as `yyyy-mm-dd`
///
/// Disabled controls are left out; checkboxes and radios only when checked.
/// The visible field values are never touched.
pub fn serialize<D: Document + ?Sized>(doc: &D, form: ElementId) -> Vec<(String, String)> {
    let filters = transmission_filters();
    FormSnapshot::capture(doc, form)
        .fields
        .iter()
        .filter(|f| !f.disabled)
        .filter(|f| f.category != FieldCategory::GroupedChoice || f.checked)
        .map(|f| (f.name.clone(), apply(&filters, f)))
        .collect()
}
