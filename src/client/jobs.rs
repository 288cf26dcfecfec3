//! Job endpoints (`/api/jobs`).

use reqwest::Method;

use super::{ApiResponse, GocdClient, OnMissing, ACCEPT_XML};
use crate::error::Result;
use crate::models::{parse_scheduled_jobs, ScheduledJob};

/// Read-only access to jobs.
pub struct Jobs<'a> {
    client: &'a GocdClient,
}

impl<'a> Jobs<'a> {
    pub(crate) fn new(client: &'a GocdClient) -> Self {
        Self { client }
    }

    /// Jobs waiting for an agent. GoCD only serves this feed as XML.
    pub async fn list_scheduled(&self) -> Result<ApiResponse<Vec<ScheduledJob>>> {
        let request = self
            .client
            .request(Method::GET, "/api/jobs/scheduled.xml", ACCEPT_XML);
        let raw = self.client.execute(request, OnMissing::Fail).await?;
        let jobs = parse_scheduled_jobs(raw.text())?;
        Ok(ApiResponse::new(raw.status(), None, Some(jobs)))
    }
}
