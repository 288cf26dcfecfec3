//! Agent endpoints (`/api/agents`).

use reqwest::Method;

use super::{ApiResponse, GocdClient, OnMissing, ACCEPT_V4};
use crate::error::{Error, Result};
use crate::models::{Agent, AgentListing};

/// Read-only access to agents.
pub struct Agents<'a> {
    client: &'a GocdClient,
}

impl<'a> Agents<'a> {
    pub(crate) fn new(client: &'a GocdClient) -> Self {
        Self { client }
    }

    /// List every agent known to the server.
    pub async fn list(&self) -> Result<ApiResponse<Vec<Agent>>> {
        let request = self.client.request(Method::GET, "/api/agents", ACCEPT_V4);
        let raw = self.client.execute(request, OnMissing::Fail).await?;
        Ok(raw.json::<AgentListing>()?.map(Vec::from))
    }

    /// Fetch one agent by UUID.
    pub async fn get(&self, uuid: &str) -> Result<ApiResponse<Agent>> {
        if uuid.trim().is_empty() {
            return Err(Error::validation("`uuid` can not be empty"));
        }
        let request = self
            .client
            .request(Method::GET, &format!("/api/agents/{}", uuid), ACCEPT_V4);
        self.client.execute(request, OnMissing::Allow).await?.json()
    }
}
