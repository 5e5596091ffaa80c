//! Login overlay: showing, submitting and the OTP step

mod harness;

use harness::*;
use modal::prelude::*;
use serde_json::json;

fn open_login(h: &Harness) -> ElementId {
    let modal = h.console.login().show(None).unwrap();
    let form = h.el("loginForm");
    let mut doc = h.console.document_mut();
    let username = doc
        .find_first(form, |d, el| d.attribute_is(el, "name", "username"))
        .unwrap();
    let password = doc
        .find_first(form, |d, el| d.attribute_is(el, "name", "password"))
        .unwrap();
    doc.set_value(username, "asha").unwrap();
    doc.set_value(password, "s3cret").unwrap();
    modal
}

fn login_submit(h: &Harness) -> ElementId {
    let form = h.el("loginForm");
    h.console
        .document()
        .find_first(form, |d, el| d.attribute_is(el, "type", "submit"))
        .unwrap()
}

fn login_error(h: &Harness, modal: ElementId) -> String {
    let doc = h.console.document();
    let slot = doc
        .find_first(modal, |d, el| d.has_class(el, "login-error"))
        .unwrap();
    doc.text(slot)
}

#[tokio::test]
async fn test_show_creates_singleton_once() {
    let h = Harness::new(LIST_PAGE);
    let first = h.console.login().show(Some("Please log in")).unwrap();
    let second = h.console.login().show(None).unwrap();
    assert_eq!(first, second);

    let doc = h.console.document();
    assert!(doc.is_displayed(first));
    assert_eq!(
        doc.find_all(doc.root(), |d, el| d.attribute_is(el, "id", "loginModal"))
            .len(),
        1
    );
    assert_eq!(
        doc.find_all(first, |d, el| d.has_class(el, "password-toggle")).len(),
        1
    );
}

#[tokio::test]
async fn test_successful_login_navigates() {
    let h = Harness::new(LIST_PAGE);
    open_login(&h);
    h.transport.push(HttpResponse::json(
        &json!({"success": true, "redirect_url": "/clients/"}),
    ));

    let outcome = h.console.handle_click(login_submit(&h)).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Login(LoginOutcome::LoggedIn("/clients/".to_string()))
    );
    assert_eq!(h.page.navigations(), vec!["/clients/".to_string()]);

    let request = h.transport.last_request().unwrap();
    assert_eq!(request.path, "/login/");
    assert_eq!(request.form_value("username"), Some("asha"));
    assert_eq!(request.form_value("password"), Some("s3cret"));
    assert_eq!(request.header("X-CSRFToken"), Some("meta-token"));
}

#[tokio::test]
async fn test_missing_redirect_uses_default() {
    let h = Harness::new(LIST_PAGE);
    open_login(&h);
    h.transport.push(HttpResponse::json(&json!({"success": true})));

    let outcome = h.console.submit_login().await.unwrap();
    assert_eq!(outcome, LoginOutcome::LoggedIn("/dashboard/".to_string()));
}

#[tokio::test]
async fn test_otp_requirement_reveals_field() {
    let h = Harness::new(LIST_PAGE);
    let modal = open_login(&h);
    h.transport.push(HttpResponse::json(
        &json!({"success": false, "require_otp": true, "error": "OTP required"}),
    ));

    let outcome = h.console.submit_login().await.unwrap();
    assert_eq!(outcome, LoginOutcome::OtpRequired);
    assert_eq!(login_error(&h, modal), "OTP required");

    let doc = h.console.document();
    let otp = doc
        .find_first(modal, |d, el| d.attribute_is(el, "name", "otp"))
        .unwrap();
    assert!(doc.is_displayed(otp));
    assert_eq!(doc.focused(), Some(otp));
    assert!(h.page.navigations().is_empty());
}

#[tokio::test]
async fn test_lockout_is_shown_inline() {
    let h = Harness::new(LIST_PAGE);
    let modal = open_login(&h);
    h.transport.push(HttpResponse::json_with_status(
        429,
        &json!({"success": false, "error": "Too many attempts. Please wait a minute."}),
    ));

    let outcome = h.console.submit_login().await.unwrap();
    assert_eq!(
        outcome,
        LoginOutcome::Failed("Too many attempts. Please wait a minute.".to_string())
    );
    assert_eq!(login_error(&h, modal), "Too many attempts. Please wait a minute.");
    assert!(h.page.alerts().is_empty());
}

#[tokio::test]
async fn test_unexplained_refusal_uses_generic_message() {
    let h = Harness::new(LIST_PAGE);
    let modal = open_login(&h);
    h.transport.push(HttpResponse::html("<p>nope</p>"));

    let outcome = h.console.submit_login().await.unwrap();
    let generic = ConsoleConfig::default().messages.login_failed;
    assert_eq!(outcome, LoginOutcome::Failed(generic.clone()));
    assert_eq!(login_error(&h, modal), generic);
}

#[tokio::test]
async fn test_network_failure_is_shown_inline() {
    let h = Harness::new(LIST_PAGE);
    let modal = open_login(&h);
    h.transport
        .push_error(TransportError::Network("offline".to_string()));

    let err = h.console.submit_login().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert_eq!(
        login_error(&h, modal),
        ConsoleConfig::default().messages.network_error
    );
}
