//! Core module containing the entity model, field rules and error types

pub mod date;
pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod validation;

pub use entity::{EntityAction, EntityName, EntityPaths, EntityTarget, FormMode, RecordId};
pub use error::ConsoleError;
pub use events::{ConsoleEvent, EventBus};
pub use field::{FieldCategory, FieldFormat, MaskKind};
