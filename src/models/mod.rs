//! Typed GoCD entities exchanged with the REST API.

mod agent;
mod job;
mod pipeline;
mod template;

pub use agent::Agent;
pub(crate) use agent::AgentListing;
pub use job::{parse_scheduled_jobs, ScheduledJob};
pub use pipeline::{
    Approval, Artifact, Authorization, EnvironmentVariable, Filter, Href, Job, Links, Material,
    MaterialAttributes, Parameter, Pipeline, PipelineStatus, Stage, Tab, Task, TaskAttributes,
};
pub use template::{PipelineTemplate, TemplateSummary};
pub(crate) use template::TemplateListing;

use serde::{Deserialize, Serialize};

/// The `{"message": "..."}` body GoCD returns for deletes and other actions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message: String,
}
