//! Client-side field validators
//!
//! Each validator is a closure over one captured field (and the form it
//! belongs to, for grouped choices). They mirror the server's checks on a
//! best-effort basis; the server stays authoritative.

use super::classifier::{FieldSnapshot, FormSnapshot};
use crate::config::MessageConfig;
use crate::core::date::is_valid_date_ddmmyyyy;
use crate::core::field::{FieldCategory, FieldFormat};
use crate::dom::ElementId;

/// Boxed validator as stored by [`Validator`]
pub type Rule = Box<dyn Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String>>;

/// Validator: required fields must hold a value (groups: any member checked)
pub fn required(message: &str) -> impl Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String> + Clone + use<> {
    let message = message.to_string();
    move |field: &FieldSnapshot, form: &FormSnapshot| {
        if field.required && !form.is_satisfied(field) {
            Err(message.clone())
        } else {
            Ok(())
        }
    }
}

/// Validator: e-mail fields must look like `local@domain.tld`
pub fn email(message: &str) -> impl Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String> + Clone + use<> {
    let message = message.to_string();
    move |field: &FieldSnapshot, _: &FormSnapshot| {
        let value = field.value.trim();
        if field.category == FieldCategory::Email
            && !value.is_empty()
            && !FieldFormat::Email.validate(value)
        {
            Err(message.clone())
        } else {
            Ok(())
        }
    }
}

/// Validator: date fields must hold a calendar-valid dd/mm/yyyy date
pub fn date(message: &str) -> impl Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String> + Clone + use<> {
    let message = message.to_string();
    move |field: &FieldSnapshot, _: &FormSnapshot| {
        let value = field.value.trim();
        if field.category == FieldCategory::Date
            && !value.is_empty()
            && !is_valid_date_ddmmyyyy(value)
        {
            Err(message.clone())
        } else {
            Ok(())
        }
    }
}

/// Validator: national ID fields must read `dddd dddd dddd`
pub fn national_id(
    message: &str,
) -> impl Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String> + Clone + use<> {
    let message = message.to_string();
    move |field: &FieldSnapshot, _: &FormSnapshot| {
        let value = field.value.trim();
        if field.category == FieldCategory::NationalId
            && !value.is_empty()
            && !FieldFormat::NationalId.validate(value)
        {
            Err(message.clone())
        } else {
            Ok(())
        }
    }
}

/// The first problem found in a form
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub element: ElementId,
    pub field: String,
    pub message: String,
}

/// Result of [`Validator::validate`]: valid, or exactly one failure
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ValidationFailure),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(failure) => Some(failure),
        }
    }
}

/// Runs the fixed rule set over a form and reports the first failure
///
/// Fields are visited in document order; for each field the rules run in
/// order (required, e-mail, date, national ID). Hidden, disabled and
/// optional fields are never checked.
pub struct Validator {
    rules: Vec<Rule>,
}

impl Validator {
    pub fn new(messages: &MessageConfig) -> Self {
        Self {
            rules: vec![
                Box::new(required(&messages.required)),
                Box::new(email(&messages.invalid_email)),
                Box::new(date(&messages.invalid_date)),
                Box::new(national_id(&messages.invalid_national_id)),
            ],
        }
    }

    /// Append a rule evaluated after the built-in ones
    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FieldSnapshot, &FormSnapshot) -> Result<(), String> + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn validate(&self, form: &FormSnapshot) -> ValidationOutcome {
        for field in form.fields.iter().filter(|f| f.participates()) {
            for rule in &self.rules {
                if let Err(message) = rule(field, form) {
                    return ValidationOutcome::Invalid(ValidationFailure {
                        element: field.element,
                        field: field.name.clone(),
                        message,
                    });
                }
            }
        }
        ValidationOutcome::Valid
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&MessageConfig::default())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.len())
            .finish()
    }
}
