//! Pipeline runtime endpoints (`/api/pipelines/{name}/...`).

use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::{require_name, ApiResponse, GocdClient, OnMissing, ACCEPT_V1, CONFIRM_HEADER};
use crate::error::Result;
use crate::models::{Message, PipelineStatus};

/// Status and scheduling controls for pipelines.
pub struct Pipelines<'a> {
    client: &'a GocdClient,
}

#[derive(Serialize)]
struct PauseRequest<'a> {
    pause_cause: &'a str,
}

impl<'a> Pipelines<'a> {
    pub(crate) fn new(client: &'a GocdClient) -> Self {
        Self { client }
    }

    /// Whether the pipeline is paused, locked and schedulable.
    pub async fn status(&self, name: &str) -> Result<ApiResponse<PipelineStatus>> {
        require_name(name)?;
        let request = self.client.request(
            Method::GET,
            &format!("/api/pipelines/{}/status", name),
            ACCEPT_V1,
        );
        self.client.execute(request, OnMissing::Allow).await?.json()
    }

    /// Pause scheduling of the pipeline.
    pub async fn pause(&self, name: &str, cause: &str) -> Result<ApiResponse<Message>> {
        require_name(name)?;
        let request = self
            .client
            .request_json(
                Method::POST,
                &format!("/api/pipelines/{}/pause", name),
                ACCEPT_V1,
                &PauseRequest { pause_cause: cause },
            )
            .header(CONFIRM_HEADER, "true");
        let response = self.client.execute(request, OnMissing::Fail).await?.json()?;
        info!(pipeline = %name, "Paused pipeline");
        Ok(response)
    }

    /// Resume scheduling of the pipeline.
    pub async fn unpause(&self, name: &str) -> Result<ApiResponse<Message>> {
        require_name(name)?;
        let request = self
            .client
            .request(
                Method::POST,
                &format!("/api/pipelines/{}/unpause", name),
                ACCEPT_V1,
            )
            .header(CONFIRM_HEADER, "true");
        let response = self.client.execute(request, OnMissing::Fail).await?.json()?;
        info!(pipeline = %name, "Unpaused pipeline");
        Ok(response)
    }
}
