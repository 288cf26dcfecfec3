//! The `gocd_pipeline_template` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, ensure_same_name, state_name, ResourceMapper};
use crate::client::GocdClient;
use crate::error::{Error, Result};
use crate::models::{PipelineTemplate, Stage};
use crate::schema::{Attribute, Block, Presence, Schema, ValueKind};

/// Resource type name.
pub const PIPELINE_TEMPLATE_RESOURCE: &str = "gocd_pipeline_template";

/// Typed form of a `gocd_pipeline_template` state bag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineTemplateState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PipelineTemplateState {
    pub fn from_value(state: Value) -> Result<Self> {
        decode_state(PIPELINE_TEMPLATE_RESOURCE, state)
    }

    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_template(&self) -> PipelineTemplate {
        PipelineTemplate {
            name: self.name.clone(),
            stages: self.stages.clone(),
            version: self.version.clone(),
            ..Default::default()
        }
    }
}

impl From<PipelineTemplate> for PipelineTemplateState {
    fn from(template: PipelineTemplate) -> Self {
        Self {
            id: Some(template.name.clone()),
            name: template.name,
            stages: template.stages,
            version: template.version,
        }
    }
}

/// Maps `gocd_pipeline_template` onto `/go/api/admin/templates`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineTemplateResource;

#[async_trait::async_trait]
impl ResourceMapper for PipelineTemplateResource {
    fn type_name(&self) -> &'static str {
        PIPELINE_TEMPLATE_RESOURCE
    }

    fn schema(&self) -> Schema {
        let stage = Schema::new()
            .attribute("name", Attribute::string(Presence::Required))
            .attribute("jobs", Attribute::new(ValueKind::list_of(ValueKind::Document), Presence::Optional));

        Schema::new()
            .attribute("id", Attribute::string(Presence::Computed))
            .attribute("name", Attribute::string(Presence::Required).force_new())
            .attribute("version", Attribute::string(Presence::Computed))
            .block("stages", Block::list(stage).at_least(1))
    }

    async fn exists(&self, client: &GocdClient, state: &Value) -> Result<bool> {
        let name = state_name(state)?;
        Ok(!client.templates().get(name).await?.is_not_found())
    }

    async fn create(&self, client: &GocdClient, planned: Value) -> Result<Value> {
        let planned = PipelineTemplateState::from_value(planned)?;
        let response = client.templates().create(&planned.to_template()).await?;
        let status = response.status();
        let template = response
            .into_body()
            .ok_or_else(|| Error::api(status, format!("empty response creating template '{}'", planned.name)))?;
        info!(template = %planned.name, "Pipeline template resource created");
        PipelineTemplateState::from(template).into_value()
    }

    async fn read(&self, client: &GocdClient, state: Value) -> Result<Option<Value>> {
        let name = state_name(&state)?;
        match client.templates().get(name).await?.into_body() {
            Some(template) => Ok(Some(PipelineTemplateState::from(template).into_value()?)),
            None => {
                debug!(template = %name, "Pipeline template no longer exists");
                Ok(None)
            },
        }
    }

    async fn update(&self, client: &GocdClient, prior: Value, planned: Value) -> Result<Value> {
        let prior = PipelineTemplateState::from_value(prior)?;
        let mut planned = PipelineTemplateState::from_value(planned)?;
        if planned.name.trim().is_empty() {
            return Err(Error::empty_name());
        }
        ensure_same_name(&prior.name, &planned.name)?;
        if planned.version.is_none() {
            planned.version = prior.version;
        }

        let response = client
            .templates()
            .update(&planned.name, &planned.to_template())
            .await?;
        let status = response.status();
        let template = response
            .into_body()
            .ok_or_else(|| Error::api(status, format!("empty response updating template '{}'", planned.name)))?;
        info!(template = %planned.name, "Pipeline template resource updated");
        PipelineTemplateState::from(template).into_value()
    }

    async fn delete(&self, client: &GocdClient, state: Value) -> Result<()> {
        let name = state_name(&state)?;
        if client.templates().delete(name).await?.is_not_found() {
            debug!(template = %name, "Pipeline template already deleted");
        } else {
            info!(template = %name, "Pipeline template resource deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_from_template() {
        let mut template = PipelineTemplate::new("shared-build");
        template.version = Some("abc".to_string());
        let state = PipelineTemplateState::from(template);

        assert_eq!(state.id.as_deref(), Some("shared-build"));
        assert_eq!(state.version.as_deref(), Some("abc"));
        assert_eq!(state.to_template().links, None);
    }

    #[test]
    fn test_validate_requires_a_stage() {
        let diagnostics = PipelineTemplateResource.validate(&json!({"name": "shared-build", "stages": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(PipelineTemplateResource
            .validate(&json!({"name": "shared-build", "stages": [{"name": "compile"}]}))
            .is_empty());
    }
}
