//! Pipeline template endpoints (`/api/admin/templates`).

use reqwest::Method;
use tracing::info;

use super::{if_match, require_name, require_version, ApiResponse, GocdClient, OnMissing, ACCEPT_V4};
use crate::error::Result;
use crate::models::{Message, PipelineTemplate, TemplateListing, TemplateSummary};

/// Create/read/update/delete for pipeline templates.
pub struct Templates<'a> {
    client: &'a GocdClient,
}

impl<'a> Templates<'a> {
    pub(crate) fn new(client: &'a GocdClient) -> Self {
        Self { client }
    }

    /// List all templates with the pipelines that use them.
    pub async fn list(&self) -> Result<ApiResponse<Vec<TemplateSummary>>> {
        let request = self
            .client
            .request(Method::GET, "/api/admin/templates", ACCEPT_V4);
        let raw = self.client.execute(request, OnMissing::Fail).await?;
        Ok(raw.json::<TemplateListing>()?.map(Vec::from))
    }

    /// Fetch a template, including its version token.
    pub async fn get(&self, name: &str) -> Result<ApiResponse<PipelineTemplate>> {
        require_name(name)?;
        let request = self.client.request(Method::GET, &path(name), ACCEPT_V4);
        let raw = self.client.execute(request, OnMissing::Allow).await?;
        Ok(with_version(raw.json()?))
    }

    /// Create a template.
    pub async fn create(&self, template: &PipelineTemplate) -> Result<ApiResponse<PipelineTemplate>> {
        require_name(&template.name)?;
        let request = self.client.request_json(
            Method::POST,
            "/api/admin/templates",
            ACCEPT_V4,
            &template.to_request_body(),
        );
        let raw = self.client.execute(request, OnMissing::Fail).await?;
        info!(template = %template.name, "Created pipeline template");
        Ok(with_version(raw.json()?))
    }

    /// Replace the template `name`. `template.version` must be current.
    pub async fn update(
        &self,
        name: &str,
        template: &PipelineTemplate,
    ) -> Result<ApiResponse<PipelineTemplate>> {
        require_name(name)?;
        let version = require_version(template.version.as_deref())?;

        let mut body = template.to_request_body();
        if body.name.is_empty() {
            body.name = name.to_string();
        }
        let request = self
            .client
            .request_json(Method::PUT, &path(name), ACCEPT_V4, &body);
        let raw = self
            .client
            .execute(if_match(request, version), OnMissing::Fail)
            .await?;
        info!(template = %name, "Updated pipeline template");
        Ok(with_version(raw.json()?))
    }

    /// Delete the template `name`. A 404 comes back as a not-found response.
    pub async fn delete(&self, name: &str) -> Result<ApiResponse<Message>> {
        require_name(name)?;
        let request = self.client.request(Method::DELETE, &path(name), ACCEPT_V4);
        let raw = self.client.execute(request, OnMissing::Allow).await?;
        raw.json()
    }
}

fn path(name: &str) -> String {
    format!("/api/admin/templates/{}", name)
}

fn with_version(response: ApiResponse<PipelineTemplate>) -> ApiResponse<PipelineTemplate> {
    let etag = response.etag().map(str::to_string);
    response.map(|mut template| {
        template.version = etag;
        template
    })
}
