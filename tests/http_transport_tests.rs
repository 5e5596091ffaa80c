//! `ReqwestTransport` against a local axum server

#![cfg(feature = "http")]

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use modal::prelude::*;
use serde_json::json;
use std::rc::Rc;
use tokio::net::TcpListener;

async fn fetch_form(headers: HeaderMap) -> impl IntoResponse {
    let ajax = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "success": true,
        "html": format!(r#"<form data-ajax="{}"><input name="name" required></form>"#, ajax),
    }))
}

async fn create(headers: HeaderMap, body: String) -> impl IntoResponse {
    let token = headers
        .get("x-csrftoken")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if token != "meta-token" {
        return (StatusCode::FORBIDDEN, "CSRF verification failed").into_response();
    }
    if body.contains("name=\"name\"") && body.contains("Asha") {
        Json(json!({"success": true})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"errors": {"name": ["This field is required."]}})),
        )
            .into_response()
    }
}

async fn set_session() -> impl IntoResponse {
    ([(header::SET_COOKIE, "sessionid=abc; Path=/")], "ok")
}

async fn whoami(headers: HeaderMap) -> impl IntoResponse {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({"cookie": cookie}))
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/client/get/", get(fetch_form))
        .route("/client/create/", post(create))
        .route("/staff/get/", get(|| async { Redirect::to("/accounts/login/") }))
        .route("/accounts/login/", get(|| async { Html("<h1>Sign in</h1>") }))
        .route("/session/", get(set_session))
        .route("/whoami/", get(whoami));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

const PAGE: &str = r#"
<meta name="csrf-token" content="meta-token">
<button id="create-client-btn">Add</button>
<button id="create-staff-btn">Add staff</button>
"#;

fn console(base_url: &str) -> (Console, Rc<RecordingPage>) {
    let doc = MemoryDocument::from_markup(PAGE).unwrap();
    let transport = Rc::new(ReqwestTransport::new(base_url).unwrap());
    let page = Rc::new(RecordingPage::new());
    (
        Console::new(ConsoleConfig::default(), doc, transport, page.clone()),
        page,
    )
}

#[tokio::test]
async fn test_get_returns_json_body() {
    let base = spawn_server().await;
    let transport = ReqwestTransport::new(&base).unwrap();

    let response = transport
        .send(HttpRequest::get("/client/get/").with_header("X-Requested-With", "XMLHttpRequest"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert!(response.is_json());
    assert!(!response.redirected);
    let body = response.json_body().unwrap();
    assert!(body["html"].as_str().unwrap().contains(r#"data-ajax="XMLHttpRequest""#));
}

#[tokio::test]
async fn test_followed_redirect_is_flagged() {
    let base = spawn_server().await;
    let transport = ReqwestTransport::new(&base).unwrap();

    let response = transport.send(HttpRequest::get("/staff/get/")).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.redirected);
}

#[tokio::test]
async fn test_cookies_persist_between_requests() {
    let base = spawn_server().await;
    let transport = ReqwestTransport::new(&base).unwrap();

    transport.send(HttpRequest::get("/session/")).await.unwrap();
    let response = transport.send(HttpRequest::get("/whoami/")).await.unwrap();
    let body = response.json_body().unwrap();
    assert_eq!(body["cookie"], "sessionid=abc");
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = ReqwestTransport::new(format!("http://{}", addr)).unwrap();

    let err = transport.send(HttpRequest::get("/client/get/")).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn test_console_round_trip_over_http() {
    let base = spawn_server().await;
    let (console, page) = console(&base);
    let add = console.document().element_by_id("create-client-btn").unwrap();

    let outcome = console.handle_click(add).await.unwrap();
    assert!(matches!(outcome, ClickOutcome::Opened(OpenOutcome::Opened(_))));

    let name = {
        let doc = console.document();
        doc.find_first(doc.root(), |d, el| d.attribute_is(el, "name", "name"))
            .unwrap()
    };
    console.document_mut().set_value(name, "Asha").unwrap();
    console.handle_field_event(name, FieldEvent::Input).unwrap();

    assert_eq!(console.submit().await.unwrap(), SubmitOutcome::Saved);
    assert_eq!(page.effects(), vec![PageEffect::Reload]);
}

#[tokio::test]
async fn test_redirect_to_login_over_http_shows_overlay() {
    let base = spawn_server().await;
    let (console, _page) = console(&base);
    let add = console.document().element_by_id("create-staff-btn").unwrap();

    let err = console.handle_click(add).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Authentication(AuthenticationError { redirected: true, .. })));
    let login = console.document().element_by_id("loginModal").unwrap();
    assert!(console.document().is_displayed(login));
}
