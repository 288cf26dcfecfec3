//! Read-only data sources.

mod agents;
mod scheduled_jobs;

pub use agents::{AgentsDataSource, AGENTS_DATA_SOURCE};
pub use scheduled_jobs::{ScheduledJobsDataSource, SCHEDULED_JOBS_DATA_SOURCE};

use serde_json::Value;

use crate::client::GocdClient;
use crate::error::Result;
use crate::schema::Schema;

/// A data source type served by the provider.
#[async_trait::async_trait]
pub trait DataSourceReader: Send + Sync {
    /// Data source type name, e.g. `gocd_agents`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Query the server and return `config` extended with the computed attributes.
    async fn read(&self, client: &GocdClient, config: Value) -> Result<Value>;
}

/// Optional string filter from a data source config.
pub(crate) fn filter<'a>(config: &'a Value, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str).filter(|v| !v.is_empty())
}
