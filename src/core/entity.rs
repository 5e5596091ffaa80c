//! Entity references, record identifiers and the request paths built from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-normalized name of a server-side record type (e.g. "client")
///
/// Always lower-cased with all whitespace removed, so it is safe to use as a
/// path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Normalize a raw entity name; `None` when nothing usable remains
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if normalized.is_empty() || normalized.contains('/') {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid entity name '{}'", value))
    }
}

impl From<EntityName> for String {
    fn from(value: EntityName) -> Self {
        value.0
    }
}

/// Identifier of one record of an entity type
///
/// Rendered links sometimes carry a template placeholder artifact (a leading
/// `:`); it is always stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_start_matches(':').trim();
        if cleaned.is_empty() || cleaned.contains('/') {
            None
        } else {
            Some(Self(cleaned.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid record id '{}'", value))
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// What a trigger element asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    Add,
    Edit,
    Delete,
}

impl EntityAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "add" | "create" | "new" => Some(Self::Add),
            "edit" | "update" | "get" => Some(Self::Edit),
            "delete" | "remove" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    /// Whether the action cannot proceed without a record identifier
    pub fn requires_id(&self) -> bool {
        !matches!(self, Self::Add)
    }
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved trigger: which entity, which record, what to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTarget {
    pub entity: EntityName,
    pub id: Option<RecordId>,
    pub action: EntityAction,
}

/// Whether the active form creates a record or updates one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Update,
}

impl FormMode {
    /// The mode is encoded in the form's action endpoint
    pub fn from_action(action: &str) -> Self {
        if action.split('/').any(|segment| segment == "update") {
            Self::Update
        } else {
            Self::Create
        }
    }
}

/// Builds the server's entity endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPaths {
    base: String,
}

impl EntityPaths {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /<entity>/get/`
    pub fn fetch_new(&self, entity: &EntityName) -> String {
        format!("{}/{}/get/", self.base, entity)
    }

    /// `GET /<entity>/get/<id>/`
    pub fn fetch_existing(&self, entity: &EntityName, id: &RecordId) -> String {
        format!("{}/{}/get/{}/", self.base, entity, id)
    }

    /// `POST /<entity>/create/`
    pub fn create(&self, entity: &EntityName) -> String {
        format!("{}/{}/create/", self.base, entity)
    }

    /// `POST /<entity>/update/<id>/`
    pub fn update(&self, entity: &EntityName, id: &RecordId) -> String {
        format!("{}/{}/update/{}/", self.base, entity, id)
    }

    /// `POST /<entity>/delete/<id>/`
    pub fn delete(&self, entity: &EntityName, id: &RecordId) -> String {
        format!("{}/{}/delete/{}/", self.base, entity, id)
    }
}
