//! Shared fixtures for console integration tests
//!
//! Builds a [`Console`] over a `MemoryDocument`, a `ScriptedTransport` and a
//! `RecordingPage`, and keeps handles to the last two so tests can script
//! responses and inspect side effects.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use chrono::NaiveDate;
use modal::prelude::*;
use std::rc::Rc;

/// A list page with one add button and one row carrying edit/delete buttons
pub const LIST_PAGE: &str = r#"
<meta name="csrf-token" content="meta-token">
<button id="create-client-btn" class="add-btn">Add client</button>
<table data-entity="client">
  <tr data-id="42">
    <td>Asha</td>
    <td>
      <button class="edit-btn" id="edit-42">Edit</button>
      <button class="delete-btn" id="delete-42">Delete</button>
      <a href="/client/update/:42/" id="edit-link-42">Open</a>
    </td>
  </tr>
</table>
<img class="preview-thumb" id="thumb" src="/media/photo.jpg">
"#;

/// A client form as the server renders it inside the modal body
pub const CLIENT_FORM: &str = r#"
<form method="post">
  <input type="hidden" name="csrfmiddlewaretoken" value="form-token">
  <input type="text" name="name" required>
  <input type="text" name="phone" class="phone-input" required>
  <input type="email" name="email">
  <input type="text" name="dob" class="date-field">
  <label><input type="checkbox" name="perm" value="view"> View</label>
  <label><input type="checkbox" name="perm" value="edit"> Edit</label>
</form>
"#;

/// The same form for an existing record
pub const CLIENT_EDIT_FORM: &str = r#"
<form method="post">
  <input type="hidden" name="csrfmiddlewaretoken" value="form-token">
  <input type="text" name="name" value="Asha" required>
  <input type="text" name="phone" class="phone-input" value="98765 43210" required>
  <input type="email" name="email" value="asha@example.com">
  <input type="text" name="dob" class="date-field" value="1990-05-17">
  <label><input type="checkbox" name="perm" value="view" checked> View</label>
  <label><input type="checkbox" name="perm" value="edit"> Edit</label>
</form>
"#;

pub struct Harness {
    pub console: Console,
    pub transport: Rc<ScriptedTransport>,
    pub page: Rc<RecordingPage>,
}

impl Harness {
    pub fn new(markup: &str) -> Self {
        Self::with_config(markup, ConsoleConfig::default())
    }

    pub fn with_config(markup: &str, config: ConsoleConfig) -> Self {
        let doc = MemoryDocument::from_markup(markup).expect("fixture markup parses");
        let transport = Rc::new(ScriptedTransport::new());
        let page = Rc::new(RecordingPage::new().with_today(today()));
        let console = Console::new(config, doc, transport.clone(), page.clone());
        Self {
            console,
            transport,
            page,
        }
    }

    /// Element by `id`, panicking when missing
    pub fn el(&self, id: &str) -> ElementId {
        self.console
            .document()
            .element_by_id(id)
            .unwrap_or_else(|| panic!("no element #{}", id))
    }

    /// First control named `name` inside the active form
    pub fn field(&self, name: &str) -> ElementId {
        let form = self.active().form;
        self.console
            .document()
            .find_first(form, |d, el| d.is_control(el) && d.attribute_is(el, "name", name))
            .unwrap_or_else(|| panic!("no field named {}", name))
    }

    pub fn active(&self) -> ActiveForm {
        self.console.modal().active().expect("a form is installed")
    }

    pub fn value(&self, el: ElementId) -> String {
        self.console
            .document()
            .value(el)
            .unwrap_or_default()
            .to_string()
    }

    /// Type `value` into `el` and fire an input event
    pub fn type_into(&self, el: ElementId, value: &str) -> Option<SaveGateReport> {
        self.console
            .document_mut()
            .set_value(el, value)
            .expect("field is attached");
        self.console
            .handle_field_event(el, FieldEvent::Input)
            .expect("field event handled")
    }

    pub fn check(&self, el: ElementId, checked: bool) -> Option<SaveGateReport> {
        self.console
            .document_mut()
            .set_checked(el, checked)
            .expect("field is attached");
        self.console
            .handle_field_event(el, FieldEvent::Change)
            .expect("field event handled")
    }

    /// Open the create form for `client` with [`CLIENT_FORM`]
    pub async fn open_client_form(&self) -> ActiveForm {
        self.transport
            .push(HttpResponse::json(&serde_json::json!({"success": true, "html": CLIENT_FORM})));
        let entity = EntityName::parse("client").expect("valid entity");
        match self.console.open_create(&entity).await.expect("form opens") {
            OpenOutcome::Opened(active) => active,
            OpenOutcome::Stale => panic!("unexpected stale open"),
        }
    }

    /// Fill every required field of [`CLIENT_FORM`] with valid values
    pub fn fill_client_form(&self) {
        self.type_into(self.field("name"), "Asha");
        self.type_into(self.field("phone"), "9876543210");
    }

    pub fn save_button(&self) -> ElementId {
        self.active().save_button.expect("save button bound")
    }

    pub fn is_disabled(&self, el: ElementId) -> bool {
        self.console.document().has_attribute(el, "disabled")
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
}

pub fn client() -> EntityName {
    EntityName::parse("client").expect("valid entity")
}

pub fn record(id: &str) -> RecordId {
    RecordId::parse(id).expect("valid record id")
}

/// Every event received so far, oldest first
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<EventEnvelope>) -> Vec<ConsoleEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}
