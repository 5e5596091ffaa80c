//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Element ids and class names the console relies on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    /// Id of the single reusable entity modal
    pub entity_modal_id: String,

    /// Id of the login overlay
    pub login_modal_id: String,

    /// Id of the image preview modal
    pub image_modal_id: String,

    /// Id of the save control inside the entity modal
    pub save_button_id: String,

    /// Class of the shared error panel inside the entity modal
    pub error_panel_class: String,

    /// Class put on offending fields
    pub invalid_class: String,

    /// Id of the login form inside the login overlay
    pub login_form_id: String,

    /// Name of the OTP field on the login form
    pub otp_field_name: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entity_modal_id: "entityModal".to_string(),
            login_modal_id: "loginModal".to_string(),
            image_modal_id: "imagePreviewModal".to_string(),
            save_button_id: "modalSaveBtn".to_string(),
            error_panel_class: "modal-errors".to_string(),
            invalid_class: "is-invalid".to_string(),
            login_form_id: "loginForm".to_string(),
            otp_field_name: "otp".to_string(),
        }
    }
}

/// Where the cross-site-request-forgery token comes from and where it goes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CsrfConfig {
    pub field_name: String,
    pub meta_name: String,
    pub cookie_name: String,
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            field_name: "csrfmiddlewaretoken".to_string(),
            meta_name: "csrf-token".to_string(),
            cookie_name: "csrftoken".to_string(),
            header_name: "X-CSRFToken".to_string(),
        }
    }
}

/// Header marking a request as a background (ajax) request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AjaxHeaderConfig {
    pub name: String,
    pub value: String,
}

impl Default for AjaxHeaderConfig {
    fn default() -> Self {
        Self {
            name: "X-Requested-With".to_string(),
            value: "XMLHttpRequest".to_string(),
        }
    }
}

/// Save-Gate tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Require every visible enabled field to be filled, not only required ones
    pub require_all_visible: bool,
}

/// User-facing texts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageConfig {
    pub required: String,
    pub invalid_email: String,
    pub invalid_date: String,
    pub invalid_national_id: String,
    pub incomplete: String,
    pub network_error: String,
    pub unexpected_response: String,
    pub session_expired: String,
    pub saving_label: String,
    /// `{entity}` is replaced with the entity name
    pub confirm_delete: String,
    pub login_failed: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            required: "This field is required.".to_string(),
            invalid_email: "Enter a valid email address.".to_string(),
            invalid_date: "Enter a valid date in dd/mm/yyyy format.".to_string(),
            invalid_national_id: "Enter the ID in 0000 0000 0000 format.".to_string(),
            incomplete: "Please complete all fields before saving.".to_string(),
            network_error: "Network error. Please check your connection and try again."
                .to_string(),
            unexpected_response: "Unexpected response from server. The page will reload."
                .to_string(),
            session_expired: "Your session has expired. Please log in again.".to_string(),
            saving_label: "Saving…".to_string(),
            confirm_delete: "Are you sure you want to delete this {entity}?".to_string(),
            login_failed: "Login failed. Please try again.".to_string(),
        }
    }
}

impl MessageConfig {
    pub fn confirm_delete_for(&self, entity: &str) -> String {
        self.confirm_delete.replace("{entity}", entity)
    }
}

/// Login overlay endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoginConfig {
    /// Used when the login form carries no `action`
    pub action: String,

    /// Used when a successful login names no `redirect_url`
    pub default_redirect: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            action: "/login/".to_string(),
            default_redirect: "/dashboard/".to_string(),
        }
    }
}

/// Logging setup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Complete configuration for the console controller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prefix for every entity endpoint (empty by default)
    pub base_path: String,
    pub selectors: SelectorConfig,
    pub csrf: CsrfConfig,
    pub ajax_header: AjaxHeaderConfig,
    pub gate: GateConfig,
    pub messages: MessageConfig,
    pub login: LoginConfig,
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Install a global `tracing` subscriber
    ///
    /// `RUST_LOG` wins over `logging.filter`. Only the first call installs
    /// anything; later calls (or a subscriber installed elsewhere) are kept.
    pub fn init_tracing(&self) {
        static INSTALLED: OnceLock<()> = OnceLock::new();
        INSTALLED.get_or_init(|| {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&self.logging.filter))
                .unwrap_or_else(|_| EnvFilter::new("info"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .try_init();
        });
    }
}
