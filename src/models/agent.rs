//! Build agents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An agent registered with the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub uuid: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    /// Bytes, or the string `"unknown"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_space: Option<Value>,
    /// `Enabled`, `Disabled` or `Pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_config_state: Option<String>,
    /// `Idle`, `Building`, `LostContact`, `Missing`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_state: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Plain names on older servers, objects with a `name` on newer ones.
    #[serde(default)]
    pub environments: Vec<Value>,
}

impl Agent {
    /// Environment names regardless of how the server encoded them.
    pub fn environment_names(&self) -> Vec<String> {
        self.environments
            .iter()
            .filter_map(|env| match env {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

#[derive(Deserialize)]
pub(crate) struct AgentListing {
    #[serde(rename = "_embedded", default)]
    embedded: AgentListingEmbedded,
}

#[derive(Deserialize, Default)]
struct AgentListingEmbedded {
    #[serde(default)]
    agents: Vec<Agent>,
}

impl From<AgentListing> for Vec<Agent> {
    fn from(listing: AgentListing) -> Self {
        listing.embedded.agents
    }
}
