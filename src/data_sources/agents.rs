//! The `gocd_agents` data source.

use serde_json::{json, Value};

use super::{filter, DataSourceReader};
use crate::client::GocdClient;
use crate::error::Result;
use crate::models::Agent;
use crate::schema::{Attribute, Presence, Schema, ValueKind};

/// Data source type name.
pub const AGENTS_DATA_SOURCE: &str = "gocd_agents";

/// Lists agents, optionally narrowed to one resource or environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentsDataSource;

#[async_trait::async_trait]
impl DataSourceReader for AgentsDataSource {
    fn type_name(&self) -> &'static str {
        AGENTS_DATA_SOURCE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute(
                "resource",
                Attribute::string(Presence::Optional).describe("Only agents offering this resource"),
            )
            .attribute(
                "environment",
                Attribute::string(Presence::Optional).describe("Only agents in this environment"),
            )
            .attribute("agents", Attribute::new(ValueKind::list_of(ValueKind::Document), Presence::Computed))
    }

    async fn read(&self, client: &GocdClient, config: Value) -> Result<Value> {
        let agents = client.agents().list().await?.into_body().unwrap_or_default();
        let resource = filter(&config, "resource");
        let environment = filter(&config, "environment");

        let selected: Vec<Agent> = agents
            .into_iter()
            .filter(|agent| resource.map_or(true, |r| agent.resources.iter().any(|a| a == r)))
            .filter(|agent| environment.map_or(true, |e| agent.environment_names().iter().any(|n| n == e)))
            .collect();

        Ok(json!({
            "resource": resource,
            "environment": environment,
            "agents": selected,
        }))
    }
}
