//! Field classification, validation and save-gating
//!
//! A form is captured once into a [`FormSnapshot`]; the [`Validator`] and the
//! [`SaveGate`] then work on that snapshot only.
//!
//! ```rust,ignore
//! let snapshot = FormSnapshot::capture(&doc, form);
//! match Validator::default().validate(&snapshot) {
//!     ValidationOutcome::Valid => {}
//!     ValidationOutcome::Invalid(failure) => println!("{}: {}", failure.field, failure.message),
//! }
//! ```

pub mod classifier;
pub mod filters;
pub mod gate;
pub mod validators;

pub use classifier::{FieldClassifier, FieldSnapshot, FormSnapshot};
pub use gate::{SaveGate, SaveGateReport};
pub use validators::{ValidationFailure, ValidationOutcome, Validator};
