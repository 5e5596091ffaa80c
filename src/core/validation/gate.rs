//! Save-Gate: whether the save action may be used right now

use super::classifier::FormSnapshot;
use super::validators::{ValidationOutcome, Validator};
use crate::config::{GateConfig, MessageConfig};
use crate::core::date::is_valid_date_ddmmyyyy;
use crate::core::field::FieldCategory;

/// Everything the gate found, not only the verdict
#[derive(Debug, Clone, PartialEq)]
pub struct SaveGateReport {
    pub eligible: bool,
    /// Names of participating fields (or groups) with no value
    pub missing: Vec<String>,
    /// Names of date fields that are not a full calendar-valid date
    pub bad_dates: Vec<String>,
    pub validation: ValidationOutcome,
}

impl SaveGateReport {
    /// Completeness and date checks passed, regardless of the validator
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.bad_dates.is_empty()
    }
}

/// Conjunction of completeness, date shape and the [`Validator`]
///
/// The three checks are computed independently: the validator stops at its
/// first failure and says nothing about the remaining fields.
#[derive(Debug)]
pub struct SaveGate {
    validator: Validator,
    config: GateConfig,
}

impl SaveGate {
    pub fn new(config: GateConfig, messages: &MessageConfig) -> Self {
        Self {
            validator: Validator::new(messages),
            config,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn evaluate(&self, form: &FormSnapshot) -> SaveGateReport {
        let mut missing: Vec<String> = Vec::new();
        let mut bad_dates = Vec::new();

        for field in form.fields.iter().filter(|f| f.participates()) {
            let counted = field.required || self.config.require_all_visible;
            if counted && !form.is_satisfied(field) && !missing.contains(&field.name) {
                missing.push(field.name.clone());
            }

            if field.category == FieldCategory::Date && (field.required || !field.is_blank()) {
                let value = field.value.trim();
                if value.len() != 10 || !is_valid_date_ddmmyyyy(value) {
                    bad_dates.push(field.name.clone());
                }
            }
        }

        let validation = self.validator.validate(form);
        let eligible = missing.is_empty() && bad_dates.is_empty() && validation.is_valid();

        SaveGateReport {
            eligible,
            missing,
            bad_dates,
            validation,
        }
    }
}

impl Default for SaveGate {
    fn default() -> Self {
        Self::new(GateConfig::default(), &MessageConfig::default())
    }
}
