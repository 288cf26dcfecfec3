//! Scheduled jobs, served as XML by `/go/api/jobs/scheduled.xml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// A job waiting for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: u64,
    pub name: String,
    /// `pipeline/counter/stage/counter/job`.
    pub build_locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
}

impl ScheduledJob {
    /// Pipeline name taken from the build locator.
    pub fn pipeline_name(&self) -> &str {
        self.build_locator.split('/').next().unwrap_or_default()
    }
}

/// Decode the scheduled-jobs XML feed.
pub fn parse_scheduled_jobs(xml: &str) -> Result<Vec<ScheduledJob>> {
    let doc: XmlScheduledJobs = quick_xml::de::from_str(xml)?;
    Ok(doc.jobs.into_iter().map(ScheduledJob::from).collect())
}

#[derive(Deserialize)]
struct XmlScheduledJobs {
    #[serde(rename = "job", default)]
    jobs: Vec<XmlJob>,
}

#[derive(Deserialize)]
struct XmlJob {
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default)]
    link: Option<XmlLink>,
    #[serde(rename = "buildLocator")]
    build_locator: String,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    resources: Option<XmlResources>,
    #[serde(rename = "environmentVariables", default)]
    environment_variables: Option<XmlVariables>,
}

#[derive(Deserialize)]
struct XmlLink {
    #[serde(rename = "@href")]
    href: String,
}

#[derive(Deserialize)]
struct XmlResources {
    #[serde(rename = "resource", default)]
    items: Vec<String>,
}

#[derive(Deserialize)]
struct XmlVariables {
    #[serde(rename = "variable", default)]
    items: Vec<XmlVariable>,
}

#[derive(Deserialize)]
struct XmlVariable {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

impl From<XmlJob> for ScheduledJob {
    fn from(job: XmlJob) -> Self {
        Self {
            id: job.id,
            name: job.name,
            build_locator: job.build_locator,
            link: job.link.map(|l| l.href),
            environment: job.environment.filter(|e| !e.is_empty()),
            resources: job.resources.map(|r| r.items).unwrap_or_default(),
            environment_variables: job
                .environment_variables
                .map(|vars| vars.items.into_iter().map(|v| (v.name, v.value)).collect())
                .unwrap_or_default(),
        }
    }
}
