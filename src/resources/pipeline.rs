//! The `gocd_pipeline` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{decode_state, ensure_same_name, state_name, validate_named, ResourceMapper};
use crate::client::GocdClient;
use crate::error::{Error, Result};
use crate::models::{EnvironmentVariable, Material, Parameter, Pipeline, Stage};
use crate::schema::{Attribute, Block, Diagnostic, Presence, Schema, ValueKind};

/// Resource type name.
pub const PIPELINE_RESOURCE: &str = "gocd_pipeline";

/// Typed form of a `gocd_pipeline` state bag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Same as `name` once the pipeline exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_behavior: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,
    /// Version token of the config document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PipelineState {
    /// Decode a state bag.
    pub fn from_value(state: Value) -> Result<Self> {
        decode_state(PIPELINE_RESOURCE, state)
    }

    /// Encode into a state bag.
    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The config document to send to the server.
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline {
            name: self.name.clone(),
            label_template: self.label_template.clone(),
            lock_behavior: self.lock_behavior.clone(),
            template: self.template.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|(name, value)| Parameter {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            environment_variables: self.environment_variables.clone(),
            materials: self.materials.clone(),
            stages: self.stages.clone(),
            version: self.version.clone(),
            ..Default::default()
        }
    }

    /// Build state from a server document.
    ///
    /// Older servers omit the group from the document, in which case
    /// `fallback_group` is kept.
    pub fn from_pipeline(pipeline: Pipeline, fallback_group: &str) -> Self {
        let group = pipeline
            .group
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| fallback_group.to_string());

        Self {
            id: Some(pipeline.name.clone()),
            name: pipeline.name,
            group,
            template: pipeline.template,
            label_template: pipeline.label_template,
            lock_behavior: pipeline.lock_behavior,
            parameters: pipeline
                .parameters
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
            environment_variables: pipeline.environment_variables,
            materials: pipeline.materials,
            stages: pipeline.stages,
            version: pipeline.version,
        }
    }
}

/// Maps `gocd_pipeline` onto `/go/api/admin/pipelines`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineResource;

#[async_trait::async_trait]
impl ResourceMapper for PipelineResource {
    fn type_name(&self) -> &'static str {
        PIPELINE_RESOURCE
    }

    fn schema(&self) -> Schema {
        let stage = Schema::new()
            .attribute("name", Attribute::string(Presence::Required))
            .attribute("fetch_materials", Attribute::bool(Presence::Optional))
            .attribute("clean_working_directory", Attribute::bool(Presence::Optional))
            .attribute("never_cleanup_artifacts", Attribute::bool(Presence::Optional))
            .attribute("jobs", Attribute::new(ValueKind::list_of(ValueKind::Document), Presence::Optional));
        let material = Schema::new()
            .attribute("type", Attribute::string(Presence::Required))
            .attribute("attributes", Attribute::document(Presence::Optional));

        Schema::new()
            .attribute("id", Attribute::string(Presence::Computed).describe("Pipeline name once created"))
            .attribute(
                "name",
                Attribute::string(Presence::Required).force_new().describe("Unique pipeline name"),
            )
            .attribute(
                "group",
                Attribute::string(Presence::Required).describe("Pipeline group the pipeline belongs to"),
            )
            .attribute(
                "template",
                Attribute::string(Presence::Optional).describe("Template providing the stages"),
            )
            .attribute("label_template", Attribute::string(Presence::Defaulted))
            .attribute(
                "lock_behavior",
                Attribute::string(Presence::Defaulted).describe("lockOnFailure, unlockWhenFinished or none"),
            )
            .attribute("parameters", Attribute::new(ValueKind::map_of(ValueKind::String), Presence::Optional))
            .attribute(
                "environment_variables",
                Attribute::new(ValueKind::list_of(ValueKind::Document), Presence::Defaulted),
            )
            .attribute(
                "version",
                Attribute::string(Presence::Computed).describe("Version token of the config document"),
            )
            .block("materials", Block::list(material))
            .block("stages", Block::list(stage))
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validate_named(&self.schema(), config);

        let has_template = config
            .get("template")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        let has_stages = config
            .get("stages")
            .and_then(Value::as_array)
            .is_some_and(|s| !s.is_empty());
        if has_template && has_stages {
            diagnostics.push(
                Diagnostic::error("Only one of 'template' or 'stages' can be specified").at("stages"),
            );
        }
        diagnostics
    }

    async fn exists(&self, client: &GocdClient, state: &Value) -> Result<bool> {
        let name = state_name(state)?;
        let response = client.pipeline_configs().get(name).await?;
        Ok(!response.is_not_found())
    }

    async fn create(&self, client: &GocdClient, planned: Value) -> Result<Value> {
        let planned = PipelineState::from_value(planned)?;
        let response = client
            .pipeline_configs()
            .create(&planned.group, &planned.to_pipeline())
            .await?;

        let status = response.status();
        let pipeline = response
            .into_body()
            .ok_or_else(|| Error::api(status, format!("empty response creating pipeline '{}'", planned.name)))?;
        info!(pipeline = %planned.name, "Pipeline resource created");
        PipelineState::from_pipeline(pipeline, &planned.group).into_value()
    }

    async fn read(&self, client: &GocdClient, state: Value) -> Result<Option<Value>> {
        let current = PipelineState::from_value(state)?;
        if current.name.trim().is_empty() {
            return Err(Error::empty_name());
        }

        let response = client.pipeline_configs().get(&current.name).await?;
        match response.into_body() {
            Some(pipeline) => Ok(Some(PipelineState::from_pipeline(pipeline, &current.group).into_value()?)),
            None => {
                debug!(pipeline = %current.name, "Pipeline no longer exists");
                Ok(None)
            },
        }
    }

    async fn update(&self, client: &GocdClient, prior: Value, planned: Value) -> Result<Value> {
        let prior = PipelineState::from_value(prior)?;
        let mut planned = PipelineState::from_value(planned)?;
        if planned.name.trim().is_empty() {
            return Err(Error::empty_name());
        }
        ensure_same_name(&prior.name, &planned.name)?;
        if planned.version.is_none() {
            planned.version = prior.version.clone();
        }

        let response = client
            .pipeline_configs()
            .update(&planned.name, &planned.to_pipeline())
            .await?;
        let status = response.status();
        let pipeline = response
            .into_body()
            .ok_or_else(|| Error::api(status, format!("empty response updating pipeline '{}'", planned.name)))?;
        info!(pipeline = %planned.name, "Pipeline resource updated");
        PipelineState::from_pipeline(pipeline, &planned.group).into_value()
    }

    async fn delete(&self, client: &GocdClient, state: Value) -> Result<()> {
        let name = state_name(&state)?;
        let response = client.pipeline_configs().delete(name).await?;
        if response.is_not_found() {
            debug!(pipeline = %name, "Pipeline already deleted");
        }
        Ok(())
    }
}
