//! Pipeline templates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::pipeline::{Links, Stage};

/// A stage list shared by several pipelines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineTemplate {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    /// Version token taken from the `ETag` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Fields not modelled here.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PipelineTemplate {
    /// Create an empty template with the given name.
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

    pub(crate) fn to_request_body(&self) -> Self {
        let mut body = self.clone();
        body.links = None;
        body.version = None;
        body
    }
}

/// A template entry in the template listing, with the pipelines using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub name: String,
    #[serde(default)]
    pub pipelines: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct TemplateListing {
    #[serde(rename = "_embedded", default)]
    embedded: TemplateListingEmbedded,
}

#[derive(Deserialize, Default)]
struct TemplateListingEmbedded {
    #[serde(default)]
    templates: Vec<TemplateListingEntry>,
}

#[derive(Deserialize)]
struct TemplateListingEntry {
    name: String,
    #[serde(rename = "_embedded", default)]
    embedded: Option<TemplateListingPipelines>,
}

#[derive(Deserialize, Default)]
struct TemplateListingPipelines {
    #[serde(default)]
    pipelines: Vec<NamedRef>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

impl From<TemplateListing> for Vec<TemplateSummary> {
    fn from(listing: TemplateListing) -> Self {
        listing
            .embedded
            .templates
            .into_iter()
            .map(|entry| TemplateSummary {
                name: entry.name,
                pipelines: entry
                    .embedded
                    .map(|e| e.pipelines.into_iter().map(|p| p.name).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }
}
