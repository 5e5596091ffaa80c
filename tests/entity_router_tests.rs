//! Entity Router resolution and click dispatch through the console

mod harness;

use harness::*;
use modal::prelude::*;
use serde_json::json;

mod resolution_tests {
    use super::*;

    fn route(markup: &str, id: &str) -> Result<EntityTarget, RoutingError> {
        let doc = MemoryDocument::from_markup(markup).unwrap();
        let el = doc.element_by_id(id).unwrap();
        EntityRouter::route(&doc, el)
    }

    #[test]
    fn test_update_link_without_data_attributes() {
        let target = route(r#"<a id="t" href="/client/update/42/">Edit</a>"#, "t").unwrap();
        assert_eq!(target.entity.as_str(), "client");
        assert_eq!(target.id.unwrap().as_str(), "42");
        assert_eq!(target.action, EntityAction::Edit);
    }

    #[test]
    fn test_placeholder_colon_is_stripped() {
        let target = route(r#"<a id="t" href="/client/update/:42/">Edit</a>"#, "t").unwrap();
        assert_eq!(target.id.unwrap().as_str(), "42");
    }

    #[test]
    fn test_entity_names_are_normalized() {
        let target = route(
            r#"<button id="t" class="add-btn" data-entity=" Loan Application ">New</button>"#,
            "t",
        )
        .unwrap();
        assert_eq!(target.entity.as_str(), "loanapplication");
        assert_eq!(target.id, None);
    }

    #[test]
    fn test_explicit_id_beats_ancestor_and_link() {
        let target = route(
            r#"<tr data-id="1"><td><a id="t" data-id="2" data-entity="client" href="/client/update/3/">E</a></td></tr>"#,
            "t",
        )
        .unwrap();
        assert_eq!(target.id.unwrap().as_str(), "2");
    }
}

mod dispatch_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_button_opens_create_form() {
        let h = Harness::new(LIST_PAGE);
        h.transport
            .push(HttpResponse::json(&json!({"success": true, "html": CLIENT_FORM})));

        let outcome = h.console.handle_click(h.el("create-client-btn")).await.unwrap();
        let ClickOutcome::Opened(OpenOutcome::Opened(active)) = outcome else {
            panic!("expected the create form");
        };
        assert_eq!(active.mode, FormMode::Create);
        assert_eq!(h.transport.last_request().unwrap().path, "/client/get/");
    }

    #[tokio::test]
    async fn test_edit_button_uses_row_id() {
        let h = Harness::new(LIST_PAGE);
        h.transport.push(HttpResponse::html(CLIENT_EDIT_FORM));

        h.console.handle_click(h.el("edit-42")).await.unwrap();
        assert_eq!(h.transport.last_request().unwrap().path, "/client/get/42/");
        assert_eq!(h.active().action, "/client/update/42/");
    }

    #[tokio::test]
    async fn test_click_on_nested_icon_reaches_trigger() {
        let h = Harness::new(
            r#"<a href="/branch/update/:7/" id="link"><i id="icon" class="bi bi-pencil"></i></a>"#,
        );
        h.transport.push(HttpResponse::html("<form><input name=\"name\" value=\"HQ\"></form>"));

        h.console.handle_click(h.el("icon")).await.unwrap();
        assert_eq!(h.transport.last_request().unwrap().path, "/branch/get/7/");
    }

    #[tokio::test]
    async fn test_edit_without_id_is_refused_without_request() {
        let h = Harness::new(r#"<button id="e" class="edit-btn" data-entity="client">Edit</button>"#);

        let err = h.console.handle_click(h.el("e")).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Routing(RoutingError::MissingId {
                action: EntityAction::Edit,
                ..
            })
        ));
        assert_eq!(err.error_code(), "MISSING_RECORD_ID");
        assert_eq!(h.transport.request_count(), 0);
        assert!(!h.console.modal().is_open());
    }

    #[tokio::test]
    async fn test_unrelated_click_is_ignored() {
        let h = Harness::new(LIST_PAGE);
        let cell = {
            let doc = h.console.document();
            doc.find_first(doc.root(), |d, el| d.is_tag(el, "td")).unwrap()
        };
        assert_eq!(h.console.handle_click(cell).await.unwrap(), ClickOutcome::Ignored);
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_click_previews_image() {
        let h = Harness::new(LIST_PAGE);

        let outcome = h.console.handle_click(h.el("thumb")).await.unwrap();
        assert_eq!(outcome, ClickOutcome::ImagePreviewed);

        let modal = h.el("imagePreviewModal");
        let doc = h.console.document();
        assert!(doc.is_displayed(modal));
        let img = doc
            .find_first(modal, |d, el| d.has_class(el, "preview-image"))
            .unwrap();
        assert_eq!(doc.attribute(img, "src"), Some("/media/photo.jpg"));
        let close = doc.find_first(modal, |d, el| d.has_class(el, "btn-close")).unwrap();
        drop(doc);

        assert_eq!(h.console.handle_click(close).await.unwrap(), ClickOutcome::Closed);
        assert!(!h.console.document().is_displayed(modal));
    }

    #[test]
    fn test_normalize_triggers_stamps_once() {
        let h = Harness::new(LIST_PAGE);
        let root = h.console.document().root();
        let stamped = h.console.normalize_triggers(root).unwrap();
        assert_eq!(stamped, 4);
        assert_eq!(h.console.normalize_triggers(root).unwrap(), 0);

        let doc = h.console.document();
        let link = doc.element_by_id("edit-link-42").unwrap();
        assert_eq!(doc.attribute(link, "data-id"), Some("42"));
        assert_eq!(doc.attribute(link, "data-entity"), Some("client"));
    }
}

mod field_event_tests {
    use super::*;

    #[tokio::test]
    async fn test_typing_clears_invalid_marking() {
        let h = Harness::new(LIST_PAGE);
        h.open_client_form().await;
        let phone = h.field("phone");
        h.console.document_mut().add_class(phone, "is-invalid").unwrap();

        h.type_into(phone, "98a76");
        assert_eq!(h.value(phone), "9876");
        assert!(!h.console.document().has_class(phone, "is-invalid"));
    }

    #[test]
    fn test_fields_outside_the_modal_are_masked_only() {
        let h = Harness::new(r#"<input id="p" name="mobile" value="">"#);
        let p = h.el("p");
        h.console.document_mut().set_value(p, "(987) 654-3210 ext").unwrap();
        let report = h.console.handle_field_event(p, FieldEvent::Change).unwrap();
        assert!(report.is_none());
        assert_eq!(h.value(p), "9876543210");
    }
}
