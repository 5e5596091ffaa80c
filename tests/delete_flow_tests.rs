//! Delete flow: confirmation, transmission and outcomes

mod harness;

use harness::*;
use modal::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_declined_confirmation_sends_nothing() {
    let h = Harness::new(LIST_PAGE);
    h.page.answer_confirm(false);

    let err = h.console.handle_click(h.el("delete-42")).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Routing(RoutingError::Declined { .. })));
    assert_eq!(h.transport.request_count(), 0);
    assert_eq!(
        h.page.effects(),
        vec![PageEffect::Confirm(
            "Are you sure you want to delete this client?".to_string()
        )]
    );
}

#[tokio::test]
async fn test_confirmed_delete_posts_and_reloads() {
    let h = Harness::new(LIST_PAGE);
    let mut events = h.console.events().subscribe();
    h.page.answer_confirm(true);
    h.transport.push(HttpResponse::json(&json!({"success": true})));

    let outcome = h.console.handle_click(h.el("delete-42")).await.unwrap();
    assert_eq!(outcome, ClickOutcome::Deleted);

    let request = h.transport.last_request().unwrap();
    assert_eq!(request.method, modal::http::Method::Post);
    assert_eq!(request.path, "/client/delete/42/");
    assert_eq!(request.header("X-CSRFToken"), Some("meta-token"));
    assert_eq!(request.header("X-Requested-With"), Some("XMLHttpRequest"));
    assert_eq!(h.page.reload_count(), 1);
    assert!(drain(&mut events).contains(&ConsoleEvent::RecordDeleted {
        entity: client(),
        id: record("42")
    }));
}

#[tokio::test]
async fn test_server_refusal_is_alerted() {
    let h = Harness::new(LIST_PAGE);
    h.transport.push(HttpResponse::json_with_status(
        400,
        &json!({"success": false, "error": "Client has open loans"}),
    ));

    let err = h.console.delete(&client(), &record("42")).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::ServerContract(ServerContractError::Rejected { .. })
    ));
    assert_eq!(h.page.alerts(), vec!["Client has open loans".to_string()]);
    assert_eq!(h.page.reload_count(), 0);
}

#[tokio::test]
async fn test_unauthorized_delete_shows_login() {
    let h = Harness::new(LIST_PAGE);
    h.transport.push(HttpResponse::status(401));

    let err = h.console.delete(&client(), &record("42")).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Authentication(_)));
    let login = h.el("loginModal");
    assert!(h.console.document().is_displayed(login));
    assert_eq!(h.page.reload_count(), 0);
}

#[tokio::test]
async fn test_network_failure_is_alerted() {
    let h = Harness::new(LIST_PAGE);
    h.transport
        .push_error(TransportError::Network("timeout".to_string()));

    let err = h.console.delete(&client(), &record("42")).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert_eq!(
        h.page.alerts(),
        vec![ConsoleConfig::default().messages.network_error]
    );
}

#[tokio::test]
async fn test_delete_without_id_is_refused_before_confirmation() {
    let h = Harness::new(r#"<button id="d" class="delete-btn" data-entity="client">Delete</button>"#);

    let err = h.console.handle_click(h.el("d")).await.unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Routing(RoutingError::MissingId {
            action: EntityAction::Delete,
            ..
        })
    ));
    assert!(h.page.effects().is_empty());
    assert_eq!(h.transport.request_count(), 0);
}
