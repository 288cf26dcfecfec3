//! The provider service: schema, configuration and resource lifecycle.
//!
//! [`ProviderService`] is the surface a provider runtime drives.
//! [`GocdProvider`] implements it by dispatching each call on the resource
//! or data source type name to the matching mapper, using the client built
//! by [`ProviderService::configure`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::GocdClient;
use crate::config::Config;
use crate::data_sources::{AgentsDataSource, DataSourceReader, ScheduledJobsDataSource};
use crate::error::{Error, Result};
use crate::resources::{PipelineResource, PipelineTemplateResource, ResourceMapper};
use crate::schema::{Attribute, Diagnostic, Presence, ProviderSchema, Schema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation;

/// Operations a provider runtime calls.
///
/// State bags are plain JSON objects shaped by [`schema`](ProviderService::schema).
/// Every call is independent; the only state kept between calls is what
/// [`configure`](ProviderService::configure) sets up.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync {
    fn schema(&self) -> ProviderSchema;

    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.into_keys().collect(),
            data_sources: schema.data_sources.into_keys().collect(),
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>> {
        Ok(validation::validate(&self.schema().provider, &config))
    }

    /// Build the API client from `config`.
    ///
    /// Diagnostics are returned rather than raised; the provider stays
    /// unconfigured when any of them is an error.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>>;

    async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<Vec<Diagnostic>>;

    /// Diff `proposed_state` against `prior_state` (`None` for a create).
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult>;

    async fn exists(&self, resource_type: &str, state: Value) -> Result<bool>;

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value>;

    /// `Ok(None)` means the entity is gone and should be dropped from state.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>>;

    async fn update(&self, resource_type: &str, prior_state: Value, planned_state: Value) -> Result<Value>;

    /// Deleting something already gone succeeds.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<()>;

    /// Adopt an entity that already exists on the server, keyed by `id`.
    async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>> {
        let _ = id;
        Err(Error::UnknownResource(resource_type.to_string()))
    }

    async fn validate_data_source_config(&self, data_source_type: &str, config: Value) -> Result<Vec<Diagnostic>>;

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value>;
}

/// Provider configuration block. Unset values fall back to `GOCD_*`
/// environment variables.
#[derive(Debug, Default, Deserialize)]
struct ProviderConfig {
    #[serde(default)]
    baseurl: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    skip_ssl_check: bool,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl From<ProviderConfig> for Config {
    fn from(config: ProviderConfig) -> Self {
        Config {
            server: config.baseurl.filter(|s| !s.is_empty()),
            username: config.username.filter(|s| !s.is_empty()),
            password: config.password,
            skip_ssl_check: config.skip_ssl_check,
            timeout_secs: config.timeout_secs,
        }
    }
}

/// GoCD provider serving `gocd_pipeline`, `gocd_pipeline_template`,
/// `gocd_agents` and `gocd_scheduled_jobs`.
pub struct GocdProvider {
    resources: BTreeMap<&'static str, Box<dyn ResourceMapper>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSourceReader>>,
    client: RwLock<Option<GocdClient>>,
}

impl Default for GocdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GocdProvider {
    /// An unconfigured provider.
    pub fn new() -> Self {
        let resources: Vec<Box<dyn ResourceMapper>> =
            vec![Box::new(PipelineResource), Box::new(PipelineTemplateResource)];
        let data_sources: Vec<Box<dyn DataSourceReader>> =
            vec![Box::new(AgentsDataSource), Box::new(ScheduledJobsDataSource)];

        Self {
            resources: resources.into_iter().map(|r| (r.type_name(), r)).collect(),
            data_sources: data_sources.into_iter().map(|d| (d.type_name(), d)).collect(),
            client: RwLock::new(None),
        }
    }

    /// A provider already configured with `client`.
    pub fn with_client(client: GocdClient) -> Self {
        let provider = Self::new();
        Self {
            client: RwLock::new(Some(client)),
            ..provider
        }
    }

    fn provider_config_schema() -> Schema {
        Schema::new()
            .attribute(
                "baseurl",
                Attribute::string(Presence::Optional).describe("GoCD server URL, with or without the trailing /go"),
            )
            .attribute("username", Attribute::string(Presence::Optional))
            .attribute("password", Attribute::string(Presence::Optional).sensitive())
            .attribute("skip_ssl_check", Attribute::bool(Presence::Optional))
            .attribute("timeout_secs", Attribute::integer(Presence::Optional))
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn ResourceMapper> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| Error::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSourceReader> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| Error::UnknownResource(data_source_type.to_string()))
    }

    /// The configured client, cloned out from under the lock.
    async fn client(&self) -> Result<GocdClient> {
        self.client.read().await.clone().ok_or_else(|| {
            Error::Configuration("provider has not been configured".to_string())
        })
    }
}

#[async_trait::async_trait]
impl ProviderService for GocdProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = self
            .resources
            .iter()
            .fold(ProviderSchema::new(Self::provider_config_schema()), |schema, (name, resource)| {
                schema.resource(*name, resource.schema())
            });
        self.data_sources
            .iter()
            .fold(schema, |schema, (name, data_source)| schema.data_source(*name, data_source.schema()))
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let diagnostics = validation::validate(&Self::provider_config_schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(count = diagnostics.len(), "Provider configuration rejected");
            return Ok(diagnostics);
        }

        let explicit = ProviderConfig::deserialize(&config)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        let settings = Config::default().with_env().merge(explicit.into());
        let client = GocdClient::new(&settings)?;

        info!(base_url = %client.base_url(), "Provider configured");
        *self.client.write().await = Some(client);
        Ok(diagnostics)
    }

    async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<Vec<Diagnostic>> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
    ) -> Result<PlanResult> {
        let schema = self.resource(resource_type)?.schema();
        let plan = PlanResult::diff(&schema, prior_state.as_ref(), &proposed_state);
        debug!(
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "Planned resource"
        );
        Ok(plan)
    }

    #[instrument(skip(self, state))]
    async fn exists(&self, resource_type: &str, state: Value) -> Result<bool> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.exists(&client, &state).await
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.create(&client, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.read(&client, current_state).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(&self, resource_type: &str, prior_state: Value, planned_state: Value) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.update(&client, prior_state, planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<()> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.delete(&client, current_state).await
    }

    #[instrument(skip(self))]
    async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        match resource.import(&client, id).await? {
            Some(state) => Ok(vec![ImportedResource::new(resource_type, state)]),
            None => Err(Error::NotFound(format!("{} '{}'", resource_type, id))),
        }
    }

    async fn validate_data_source_config(&self, data_source_type: &str, config: Value) -> Result<Vec<Diagnostic>> {
        let schema = self.data_source(data_source_type)?.schema();
        Ok(validation::validate(&schema, &config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        data_source.read(&client, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_schema_lists_all_types() {
        let provider = GocdProvider::new();
        let metadata = provider.metadata();
        assert_eq!(metadata.resources, vec!["gocd_pipeline", "gocd_pipeline_template"]);
        assert_eq!(metadata.data_sources, vec!["gocd_agents", "gocd_scheduled_jobs"]);

        let schema = provider.schema();
        assert!(schema.resources["gocd_pipeline"].forces_new("name"));
        assert!(schema.provider.attributes["password"].sensitive);
    }

    #[tokio::test]
    async fn test_operations_before_configure() {
        let provider = GocdProvider::new();
        let err = provider
            .read("gocd_pipeline", json!({"name": "build"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = GocdProvider::new();
        let err = provider.plan("gocd_stage", None, json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownResource(ref t) if t == "gocd_stage"));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = provider
            .read_data_source("gocd_nothing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_with_baseurl() {
        let provider = GocdProvider::new();
        let diagnostics = provider
            .configure(json!({
                "baseurl": "https://ci.example.com",
                "username": "admin",
                "password": "secret"
            }))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());

        let client = provider.client().await.unwrap();
        assert_eq!(client.base_url(), "https://ci.example.com/go");
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_types() {
        let provider = GocdProvider::new();
        let diagnostics = provider
            .configure(json!({"baseurl": "https://ci.example.com", "skip_ssl_check": "yes"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(provider.client().await.is_err());
    }

    #[tokio::test]
    async fn test_plan_marks_rename_as_replace() {
        let provider = GocdProvider::new();
        let prior = json!({"id": "build", "name": "build", "group": "ops", "version": "v1"});

        let plan = provider
            .plan("gocd_pipeline", Some(prior.clone()), json!({"name": "build", "group": "dev"}))
            .await
            .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["version"], "v1");

        let plan = provider
            .plan("gocd_pipeline", Some(prior), json!({"name": "deploy", "group": "ops"}))
            .await
            .unwrap();
        assert!(plan.requires_replace);
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let provider = GocdProvider::new();
        let diagnostics = provider
            .validate_resource_config("gocd_pipeline", json!({"name": "build"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("group"));
    }
}
