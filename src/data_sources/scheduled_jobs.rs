//! The `gocd_scheduled_jobs` data source.

use serde_json::{json, Value};

use super::{filter, DataSourceReader};
use crate::client::GocdClient;
use crate::error::Result;
use crate::schema::{Attribute, Presence, Schema, ValueKind};

/// Data source type name.
pub const SCHEDULED_JOBS_DATA_SOURCE: &str = "gocd_scheduled_jobs";

/// Jobs waiting for an agent, optionally for one pipeline only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduledJobsDataSource;

#[async_trait::async_trait]
impl DataSourceReader for ScheduledJobsDataSource {
    fn type_name(&self) -> &'static str {
        SCHEDULED_JOBS_DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute("pipeline", Attribute::string(Presence::Optional).describe("Only jobs of this pipeline"))
            .attribute("jobs", Attribute::new(ValueKind::list_of(ValueKind::Document), Presence::Computed))
    }

    async fn read(&self, client: &GocdClient, config: Value) -> Result<Value> {
        let pipeline = filter(&config, "pipeline");
        let jobs: Vec<_> = client
            .jobs()
            .list_scheduled()
            .await?
            .into_body()
            .unwrap_or_default()
            .into_iter()
            .filter(|job| pipeline.map_or(true, |p| job.pipeline_name() == p))
            .collect();

        Ok(json!({
            "pipeline": pipeline,
            "jobs": jobs,
        }))
    }
}
