//! Pipeline configuration documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Navigation links attached to config documents (`_links`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Links {
    /// Link to this document.
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Href>,
    /// Link to the API documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Href>,
    /// URI template to look up siblings by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find: Option<Href>,
}

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
    /// Target URL.
    pub href: String,
}

/// A pipeline definition as exchanged with `/go/api/admin/pipelines`.
///
/// `version` is not part of the JSON document GoCD serves; the client fills
/// it from the `ETag` header and strips it from outgoing bodies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique pipeline name.
    #[serde(default)]
    pub name: String,
    /// Pipeline group, returned by newer servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_template: Option<String>,
    /// One of `lockOnFailure`, `unlockWhenFinished` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_behavior: Option<String>,
    /// Older servers express locking as a boolean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_pipeline_locking: Option<bool>,
    /// Template the stages come from. Mutually exclusive with `stages`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    /// Version token taken from the `ETag` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Fields not modelled here, such as `timer` or `tracking_tool`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Pipeline {
    /// Create an empty pipeline with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Drop the navigation links.
    pub fn remove_links(&mut self) {
        self.links = None;
    }

    /// A copy suitable for a request body: no links, no version.
    pub(crate) fn to_request_body(&self) -> Self {
        let mut body = self.clone();
        body.links = None;
        body.version = None;
        body
    }
}

/// A `#{param}` value declared on a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// An environment variable on a pipeline, stage or job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,
    #[serde(default)]
    pub secure: bool,
}

/// A source trigger attached to a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// `git`, `svn`, `hg`, `p4`, `tfs`, `dependency`, `package` or `plugin`.
    #[serde(rename = "type")]
    pub material_type: String,
    #[serde(default)]
    pub attributes: MaterialAttributes,
}

/// Attributes of a [`Material`]. Fields not modelled here are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shallow_clone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodule_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert_filter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Upstream pipeline for `dependency` materials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    /// Upstream stage for `dependency` materials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Paths ignored when deciding whether a material changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// A stage of a pipeline or template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_materials: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_working_directory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub never_cleanup_artifacts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<Approval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Whether a stage runs automatically (`success`) or waits (`manual`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    #[serde(rename = "type")]
    pub approval_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
}

/// Users and roles allowed to approve a manual stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

/// A job inside a stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// A number, `"all"` or null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_instance_count: Option<Value>,
    /// Minutes, `"never"` or null for the server default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<Tab>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

/// A task run by a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `exec`, `ant`, `nant`, `rake`, `fetch` or `pluggable_task`.
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub attributes: TaskAttributes,
}

/// Attributes of a [`Task`]. Type-specific fields not modelled here are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskAttributes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_if: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_cancel: Option<Box<Task>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A custom tab shown on the job details page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub name: String,
    pub path: String,
}

/// A build or test artifact published by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Runtime status of a pipeline (`/go/api/pipelines/{name}/status`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_by: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub schedulable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "_links": {
                "self": {"href": "https://ci.example.com/go/api/admin/pipelines/build"},
                "doc": {"href": "https://api.gocd.org/#pipeline-config"}
            },
            "name": "build",
            "group": "first",
            "label_template": "${COUNT}",
            "lock_behavior": "none",
            "materials": [{
                "type": "git",
                "attributes": {
                    "url": "https://github.com/gocd/gocd",
                    "branch": "master",
                    "auto_update": true,
                    "filter": null,
                    "shallow_clone": false
                }
            }],
            "stages": [{
                "name": "compile",
                "fetch_materials": true,
                "approval": {"type": "success", "authorization": {"roles": [], "users": []}},
                "jobs": [{
                    "name": "make",
                    "run_instance_count": null,
                    "timeout": "never",
                    "tasks": [{
                        "type": "exec",
                        "attributes": {
                            "run_if": ["passed"],
                            "command": "make",
                            "arguments": ["all"]
                        }
                    }]
                }]
            }]
        })
    }

    #[test]
    fn test_pipeline_decodes_server_document() {
        let pipeline: Pipeline = serde_json::from_value(sample()).unwrap();

        assert_eq!(pipeline.name, "build");
        assert_eq!(pipeline.group.as_deref(), Some("first"));
        assert_eq!(pipeline.materials[0].material_type, "git");
        assert_eq!(
            pipeline.materials[0].attributes.url.as_deref(),
            Some("https://github.com/gocd/gocd")
        );
        assert_eq!(pipeline.stages[0].jobs[0].tasks[0].attributes.command.as_deref(), Some("make"));
        assert_eq!(pipeline.stages[0].jobs[0].timeout, Some(json!("never")));
        assert!(pipeline.links.is_some());
        assert!(pipeline.version.is_none());
    }

    #[test]
    fn test_unknown_task_attributes_survive() {
        let task: Task = serde_json::from_value(json!({
            "type": "fetch",
            "attributes": {"pipeline": "upstream", "stage": "dist", "job": "pkg", "is_source_a_file": true}
        }))
        .unwrap();

        assert_eq!(task.attributes.extra["job"], json!("pkg"));
        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["attributes"]["is_source_a_file"], json!(true));
    }

    #[test]
    fn test_request_body_strips_links_and_version() {
        let mut pipeline: Pipeline = serde_json::from_value(sample()).unwrap();
        pipeline.version = Some("abc123".to_string());

        let body = serde_json::to_value(pipeline.to_request_body()).unwrap();
        assert!(body.get("_links").is_none());
        assert!(body.get("version").is_none());
        assert_eq!(body["name"], "build");
    }

    #[test]
    fn test_unmodelled_fields_reach_request_body() {
        let mut document = sample();
        document["timer"] = json!({"spec": "0 0 22 ? * MON-FRI", "only_on_changes": true});
        document["tracking_tool"] = json!({"type": "generic", "attributes": {"url_pattern": "https://jira/${ID}"}});
        let pipeline: Pipeline = serde_json::from_value(document).unwrap();
        assert!(pipeline.extra.contains_key("timer"));
        assert!(!pipeline.extra.contains_key("_links"));

        let body = serde_json::to_value(pipeline.to_request_body()).unwrap();
        assert_eq!(body["timer"]["spec"], "0 0 22 ? * MON-FRI");
        assert_eq!(body["tracking_tool"]["type"], "generic");
        assert!(body.get("_links").is_none());
    }

    #[test]
    fn test_remove_links() {
        let mut pipeline: Pipeline = serde_json::from_value(sample()).unwrap();
        pipeline.remove_links();
        assert!(pipeline.links.is_none());
    }
}
