//! Mapping between provider state bags and GoCD config documents.
//!
//! Each resource type implements [`ResourceMapper`]: it owns its schema and
//! translates the JSON bag the runtime persists into a typed state, and the
//! typed state into client calls.

mod pipeline;
mod pipeline_template;

pub use pipeline::{PipelineResource, PipelineState, PIPELINE_RESOURCE};
pub use pipeline_template::{PipelineTemplateResource, PipelineTemplateState, PIPELINE_TEMPLATE_RESOURCE};

use serde_json::Value;

use crate::client::GocdClient;
use crate::error::{Error, Result};
use crate::schema::{Diagnostic, Schema};
use crate::validation;

/// Lifecycle of one managed resource type.
#[async_trait::async_trait]
pub trait ResourceMapper: Send + Sync {
    /// Resource type name, e.g. `gocd_pipeline`.
    fn type_name(&self) -> &'static str;

    /// Schema of the state bag.
    fn schema(&self) -> Schema;

    /// Check a configuration bag before planning.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate_named(&self.schema(), config)
    }

    /// Returns true if the entity named in `state` exists on the server.
    async fn exists(&self, client: &GocdClient, state: &Value) -> Result<bool>;

    /// Create the entity and return the resulting state.
    async fn create(&self, client: &GocdClient, planned: Value) -> Result<Value>;

    /// Refresh `state` from the server. `None` means the entity is gone.
    async fn read(&self, client: &GocdClient, state: Value) -> Result<Option<Value>>;

    /// Apply `planned` on top of `prior` and return the resulting state.
    async fn update(&self, client: &GocdClient, prior: Value, planned: Value) -> Result<Value>;

    /// Delete the entity. Deleting something already gone succeeds.
    async fn delete(&self, client: &GocdClient, state: Value) -> Result<()>;

    /// Build state for an existing entity addressed by name.
    async fn import(&self, client: &GocdClient, id: &str) -> Result<Option<Value>> {
        if id.trim().is_empty() {
            return Err(Error::empty_name());
        }
        self.read(client, serde_json::json!({ "name": id })).await
    }
}

/// The `name` attribute of a state bag, rejecting a missing or empty one.
pub(crate) fn state_name(state: &Value) -> Result<&str> {
    state
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(Error::empty_name)
}

/// Schema validation plus the GoCD naming rules for `name`.
pub(crate) fn validate_named(schema: &Schema, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = validation::validate(schema, config);
    if let Some(name) = config.get("name").and_then(Value::as_str) {
        diagnostics.extend(validation::check_name(name, "name"));
    }
    diagnostics
}

/// Decode a state bag, reporting malformed input as a validation error.
pub(crate) fn decode_state<T: serde::de::DeserializeOwned>(resource_type: &str, state: Value) -> Result<T> {
    serde_json::from_value(state)
        .map_err(|e| Error::validation(format!("invalid {} state: {}", resource_type, e)))
}

/// Reject a rename; names are the identity of GoCD config documents.
pub(crate) fn ensure_same_name(prior: &str, planned: &str) -> Result<()> {
    if prior != planned {
        return Err(Error::validation(format!(
            "`name` can not be changed from '{}' to '{}'; the resource must be replaced",
            prior, planned
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_name() {
        assert_eq!(state_name(&json!({"name": "build"})).unwrap(), "build");

        for state in [json!({}), json!({"name": ""}), json!({"name": "  "}), json!({"name": 3})] {
            let err = state_name(&state).unwrap_err();
            assert_eq!(err.to_string(), "`name` can not be empty");
        }
    }

    #[test]
    fn test_ensure_same_name() {
        assert!(ensure_same_name("build", "build").is_ok());
        let err = ensure_same_name("build", "deploy").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
