//! Field categories, input masks and format checks

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Semantic category of a form control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    PlainText,
    Email,
    Date,
    /// Checkbox or radio; satisfied as a group by name
    GroupedChoice,
    /// 12-digit national ID rendered as `dddd dddd dddd`
    NationalId,
}

/// Live input mask applied while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskKind {
    /// Digits only, at most 10
    Phone,
    /// Digits only, at most 12, grouped by four
    NationalId,
}

impl MaskKind {
    /// Apply the mask to a raw value
    pub fn apply(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        match self {
            MaskKind::Phone => digits.chars().take(10).collect(),
            MaskKind::NationalId => {
                let digits: Vec<char> = digits.chars().take(12).collect();
                digits
                    .chunks(4)
                    .map(|chunk| chunk.iter().collect::<String>())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }
}

/// Format checks mirrored from the server's validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    NationalId,
    Custom(Regex),
}

impl FieldFormat {
    pub fn validate(&self, value: &str) -> bool {
        match self {
            FieldFormat::Email => Self::is_valid_email(value),
            FieldFormat::NationalId => Self::is_valid_national_id(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
        });
        regex.is_match(email)
    }

    fn is_valid_national_id(value: &str) -> bool {
        static ID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ID_REGEX
            .get_or_init(|| Regex::new(r"^[0-9]{4} [0-9]{4} [0-9]{4}$").expect("national id regex is valid"));
        regex.is_match(value)
    }
}
