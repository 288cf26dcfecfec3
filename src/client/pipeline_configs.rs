//! Pipeline configuration endpoints (`/api/admin/pipelines`).

use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::{if_match, require_name, require_version, ApiResponse, GocdClient, OnMissing, ACCEPT_V6};
use crate::error::{Error, Result};
use crate::models::{Message, Pipeline};

/// Create/read/update/delete for pipeline configs.
pub struct PipelineConfigs<'a> {
    client: &'a GocdClient,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    group: &'a str,
    pipeline: Pipeline,
}

impl<'a> PipelineConfigs<'a> {
    pub(crate) fn new(client: &'a GocdClient) -> Self {
        Self { client }
    }

    /// Fetch a pipeline config. The returned pipeline carries its version
    /// token in `version`.
    pub async fn get(&self, name: &str) -> Result<ApiResponse<Pipeline>> {
        require_name(name)?;
        let request = self.client.request(Method::GET, &path(name), ACCEPT_V6);
        let raw = self.client.execute(request, OnMissing::Allow).await?;
        Ok(with_version(raw.json()?))
    }

    /// Create a pipeline config in `group`.
    pub async fn create(&self, group: &str, pipeline: &Pipeline) -> Result<ApiResponse<Pipeline>> {
        if group.trim().is_empty() {
            return Err(Error::validation("`group` can not be empty"));
        }
        require_name(&pipeline.name)?;

        let body = CreateRequest {
            group,
            pipeline: pipeline.to_request_body(),
        };
        let request = self
            .client
            .request_json(Method::POST, "/api/admin/pipelines", ACCEPT_V6, &body);
        let raw = self.client.execute(request, OnMissing::Fail).await?;
        info!(pipeline = %pipeline.name, group = %group, "Created pipeline config");
        Ok(with_version(raw.json()?))
    }

    /// Replace the pipeline config `name`.
    ///
    /// `pipeline.version` must hold the current version token; a stale token
    /// yields [`Error::Conflict`].
    pub async fn update(&self, name: &str, pipeline: &Pipeline) -> Result<ApiResponse<Pipeline>> {
        require_name(name)?;
        let version = require_version(pipeline.version.as_deref())?;

        let mut body = pipeline.to_request_body();
        if body.name.is_empty() {
            body.name = name.to_string();
        }
        let request = self
            .client
            .request_json(Method::PUT, &path(name), ACCEPT_V6, &body);
        let raw = self
            .client
            .execute(if_match(request, version), OnMissing::Fail)
            .await?;
        info!(pipeline = %name, "Updated pipeline config");
        Ok(with_version(raw.json()?))
    }

    /// Delete the pipeline config `name`. A 404 comes back as a not-found
    /// response rather than an error.
    ///
    /// GoCD answers 406 when the pipeline cannot be deleted (for example
    /// while an environment still references it). That surfaces as
    /// [`Error::Api`] with status 406 and the server's message.
    pub async fn delete(&self, name: &str) -> Result<ApiResponse<Message>> {
        require_name(name)?;
        let request = self.client.request(Method::DELETE, &path(name), ACCEPT_V6);
        let raw = self.client.execute(request, OnMissing::Allow).await?;
        if !raw.is_not_found() {
            info!(pipeline = %name, "Deleted pipeline config");
        }
        raw.json()
    }
}

fn path(name: &str) -> String {
    format!("/api/admin/pipelines/{}", name)
}

fn with_version(response: ApiResponse<Pipeline>) -> ApiResponse<Pipeline> {
    let etag = response.etag().map(str::to_string);
    response.map(|mut pipeline| {
        pipeline.version = etag;
        pipeline
    })
}
