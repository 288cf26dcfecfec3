//! Attribute schemas for the provider config, resources and data sources.
//!
//! A schema names the keys a state bag may carry. Each key is either set by
//! the user (required or optional), set by the user with a server-side
//! fallback (defaulted), or filled in by the provider from the server
//! response (computed). Repeated nested documents such as `stages`
//! and `materials` are described by a [`Block`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Integer,
    Bool,
    ListOf(Box<ValueKind>),
    MapOf(Box<ValueKind>),
    /// Free-form JSON, passed through to GoCD untouched.
    Document,
}

impl ValueKind {
    pub fn list_of(element: ValueKind) -> Self {
        Self::ListOf(Box::new(element))
    }

    pub fn map_of(element: ValueKind) -> Self {
        Self::MapOf(Box::new(element))
    }

    /// Whether `value` has this shape. Element shapes are not checked.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::ListOf(_) => value.is_array(),
            Self::MapOf(_) => value.is_object(),
            Self::Document => true,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::ListOf(_) => "list",
            Self::MapOf(_) => "map",
            Self::Document => "document",
        }
    }
}

/// Who sets an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Must be set in configuration.
    Required,
    /// May be set in configuration.
    Optional,
    /// May be set in configuration; the server supplies a value otherwise.
    Defaulted,
    /// Only ever set by the provider from server responses.
    Computed,
}

/// A single attribute of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: ValueKind,
    pub presence: Presence,
    /// Changing the value replaces the entity instead of updating it.
    #[serde(default)]
    pub force_new: bool,
    /// The value must not be echoed in logs or rendered output.
    #[serde(default)]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    pub fn new(kind: ValueKind, presence: Presence) -> Self {
        Self {
            kind,
            presence,
            force_new: false,
            sensitive: false,
            description: None,
        }
    }

    pub fn string(presence: Presence) -> Self {
        Self::new(ValueKind::String, presence)
    }

    pub fn integer(presence: Presence) -> Self {
        Self::new(ValueKind::Integer, presence)
    }

    pub fn bool(presence: Presence) -> Self {
        Self::new(ValueKind::Bool, presence)
    }

    pub fn document(presence: Presence) -> Self {
        Self::new(ValueKind::Document, presence)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }
}

/// A repeated nested document, e.g. the `stages` of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub item: Schema,
    /// Fewest items accepted; an absent block counts as zero.
    #[serde(default)]
    pub min_items: usize,
}

impl Block {
    pub fn list(item: Schema) -> Self {
        Self { item, min_items: 0 }
    }

    pub fn at_least(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }
}

/// Attributes and nested blocks of one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Bumped when the state bag layout changes incompatibly.
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, Block>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Top-level attributes only the provider sets.
    pub fn computed(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.is_computed())
            .map(|(name, _)| name.as_str())
    }

    /// Whether the server may fill in `name`, or parts of it, when the
    /// configuration leaves them out. Blocks always qualify.
    pub fn server_defaulted(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
            || self
                .attributes
                .get(name)
                .is_some_and(|attribute| attribute.presence == Presence::Defaulted)
    }

    pub fn forces_new(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|attribute| attribute.force_new)
    }
}

/// Every schema the provider serves, keyed by type name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    #[serde(default)]
    pub data_sources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    pub fn new(provider: Schema) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    pub fn resource(mut self, type_name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(type_name.into(), schema);
        self
    }

    pub fn data_source(mut self, type_name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(type_name.into(), schema);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A validation finding, optionally tied to an attribute path such as
/// `stages.0.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn error(summary: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, summary)
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, summary)
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
