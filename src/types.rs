//! Plan, import and metadata types returned by the provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Add,
    Remove,
    Modify,
}

/// One top-level attribute that differs between prior and proposed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
}

impl AttributeChange {
    fn between(attribute: &str, before: Option<&Value>, after: Option<&Value>) -> Option<Self> {
        let action = match (before, after) {
            (Some(b), Some(a)) if b == a => return None,
            (Some(_), Some(_)) => ChangeAction::Modify,
            (None, Some(_)) => ChangeAction::Add,
            (Some(_), None) => ChangeAction::Remove,
            (None, None) => return None,
        };
        Some(Self {
            attribute: attribute.to_string(),
            action,
            before: before.cloned(),
            after: after.cloned(),
        })
    }
}

/// What applying a configuration would do to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State handed to create or update, with computed attributes carried over.
    pub planned_state: Value,
    pub changes: Vec<AttributeChange>,
    /// A `force_new` attribute changed, so the entity must be recreated.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Diff `proposed` against `prior`, or against nothing for a create.
    ///
    /// Null values count as absent. Computed attributes are copied from
    /// `prior` into the planned state and never reported as changes.
    ///
    /// Blocks and defaulted attributes keep their prior value when the
    /// configuration omits them, or sets only values the prior value
    /// already agrees with, so defaults GoCD fills in do not show up as
    /// perpetual changes.
    pub fn diff(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> Self {
        let empty = Map::new();
        let before = prior.and_then(Value::as_object).unwrap_or(&empty);
        let mut planned = proposed.as_object().cloned().unwrap_or_default();

        let computed: BTreeSet<&str> = schema.computed().collect();
        for name in &computed {
            if let Some(value) = before.get(*name) {
                planned.entry(name.to_string()).or_insert_with(|| value.clone());
            }
        }

        for (name, stored) in before {
            if computed.contains(name.as_str()) || !schema.server_defaulted(name) {
                continue;
            }
            let configured = planned.get(name).unwrap_or(&Value::Null);
            if covers(stored, configured) {
                planned.insert(name.clone(), stored.clone());
            }
        }

        let keys: BTreeSet<&str> = before.keys().chain(planned.keys()).map(String::as_str).collect();
        let changes: Vec<AttributeChange> = keys
            .into_iter()
            .filter(|key| !computed.contains(key))
            .filter_map(|key| {
                let present = |fields: &Map<String, Value>| fields.get(key).filter(|v| !v.is_null()).cloned();
                AttributeChange::between(key, present(before).as_ref(), present(&planned).as_ref())
            })
            .collect();

        let requires_replace = prior.is_some() && changes.iter().any(|c| schema.forces_new(&c.attribute));
        Self {
            planned_state: Value::Object(planned),
            changes,
            requires_replace,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Whether `stored` agrees with every value `configured` sets.
///
/// Object keys missing or null in `configured` are ignored; lists must
/// have the same length and agree item by item.
fn covers(stored: &Value, configured: &Value) -> bool {
    match (stored, configured) {
        (_, Value::Null) => true,
        (Value::Object(stored), Value::Object(configured)) => configured
            .iter()
            .all(|(key, value)| value.is_null() || stored.get(key).is_some_and(|s| covers(s, value))),
        (Value::Array(stored), Value::Array(configured)) => {
            stored.len() == configured.len() && stored.iter().zip(configured).all(|(s, c)| covers(s, c))
        },
        _ => stored == configured,
    }
}

/// State recovered for an entity that already exists on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    pub resource_type: String,
    pub state: Value,
}

impl ImportedResource {
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Type names a provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
}
