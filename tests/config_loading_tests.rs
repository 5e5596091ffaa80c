//! Loading console configuration from YAML files

mod harness;

use harness::*;
use modal::prelude::*;
use std::io::Write;

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
base_path: /console
selectors:
  entity_modal_id: recordModal
csrf:
  header_name: X-CSRF-Token
messages:
  saving_label: "Please wait"
"#,
    );

    let config = ConsoleConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.base_path, "/console");
    assert_eq!(config.selectors.entity_modal_id, "recordModal");
    assert_eq!(config.selectors.login_modal_id, "loginModal");
    assert_eq!(config.csrf.header_name, "X-CSRF-Token");
    assert_eq!(config.csrf.field_name, "csrfmiddlewaretoken");
    assert_eq!(config.messages.saving_label, "Please wait");
}

#[test]
fn test_empty_file_is_all_defaults() {
    let file = write_config("{}\n");
    let config = ConsoleConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config, ConsoleConfig::default());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    assert!(ConsoleConfig::from_yaml_file(path.to_str().unwrap()).is_err());
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let file = write_config("selectors: [not, a, map]\n");
    assert!(ConsoleConfig::from_yaml_file(file.path().to_str().unwrap()).is_err());
}

#[tokio::test]
async fn test_loaded_config_drives_the_console() {
    let file = write_config(
        r#"
base_path: /console/
selectors:
  entity_modal_id: recordModal
ajax_header:
  name: X-Ajax
  value: "1"
"#,
    );
    let config = ConsoleConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    let h = Harness::with_config(LIST_PAGE, config);

    let active = h.open_client_form().await;
    let request = h.transport.last_request().unwrap();
    assert_eq!(request.path, "/console/client/get/");
    assert_eq!(request.header("X-Ajax"), Some("1"));
    assert_eq!(active.action, "/console/client/create/");
    assert!(h.console.document().element_by_id("recordModal").is_some());
    assert!(h.console.document().element_by_id("entityModal").is_none());
}
