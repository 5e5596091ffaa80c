//! Cross-site-request-forgery token lookup

use crate::config::CsrfConfig;
use crate::dom::{Document, DocumentExt, ElementId};
use crate::page::Page;

/// Find the CSRF token to send with a state-changing request
///
/// Preference order: a hidden field named `field_name` (inside `scope` when
/// given, else anywhere), a `<meta name=meta_name content=...>` tag, then the
/// `cookie_name` cookie. Empty values are skipped.
pub fn resolve_csrf_token<D: Document + ?Sized>(
    doc: &D,
    scope: Option<ElementId>,
    page: &dyn Page,
    config: &CsrfConfig,
) -> Option<String> {
    let search_root = scope.unwrap_or_else(|| doc.root());
    let field = doc
        .find_first(search_root, |d, el| {
            d.is_tag(el, "input") && d.attribute_is(el, "name", &config.field_name)
        })
        .or_else(|| {
            doc.find_first(doc.root(), |d, el| {
                d.is_tag(el, "input") && d.attribute_is(el, "name", &config.field_name)
            })
        });
    if let Some(token) = field.and_then(|el| non_empty(doc.value(el))) {
        return Some(token);
    }

    let meta = doc.find_first(doc.root(), |d, el| {
        d.is_tag(el, "meta") && d.attribute_is(el, "name", &config.meta_name)
    });
    if let Some(token) = meta.and_then(|el| non_empty(doc.attribute(el, "content"))) {
        return Some(token);
    }

    non_empty(page.cookie(&config.cookie_name).as_deref())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::page::RecordingPage;

    #[test]
    fn test_hidden_field_wins() {
        let doc = MemoryDocument::from_markup(
            r#"<meta name="csrf-token" content="from-meta">
               <form id="f"><input type="hidden" name="csrfmiddlewaretoken" value="from-field"></form>"#,
        )
        .unwrap();
        let page = RecordingPage::new().with_cookie("csrftoken", "from-cookie");
        let form = doc.element_by_id("f");
        let token = resolve_csrf_token(&doc, form, &page, &CsrfConfig::default());
        assert_eq!(token.as_deref(), Some("from-field"));
    }

    #[test]
    fn test_meta_then_cookie() {
        let page = RecordingPage::new().with_cookie("csrftoken", "from-cookie");
        let doc = MemoryDocument::from_markup(r#"<meta name="csrf-token" content="from-meta">"#).unwrap();
        assert_eq!(
            resolve_csrf_token(&doc, None, &page, &CsrfConfig::default()).as_deref(),
            Some("from-meta")
        );

        let doc = MemoryDocument::from_markup(
            r#"<form><input type="hidden" name="csrfmiddlewaretoken" value=""></form>"#,
        )
        .unwrap();
        assert_eq!(
            resolve_csrf_token(&doc, None, &page, &CsrfConfig::default()).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(
            resolve_csrf_token(&doc, None, &RecordingPage::new(), &CsrfConfig::default()),
            None
        );
    }
}
