//! `*-pipeline-config` commands.

use std::path::PathBuf;

use super::{required, Context, NameArgs};
use crate::client::ApiResponse;
use crate::error::{Error, Result};
use crate::models::{Message, Pipeline};

/// Flags of `create-pipeline-config`.
#[derive(Debug, Clone, clap::Args)]
pub struct CreateArgs {
    /// Pipeline group to create the pipeline in
    #[arg(long)]
    pub group: Option<String>,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

/// Flags of `update-pipeline-config`.
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    /// Version token from `get-pipeline-config`
    #[arg(long)]
    pub pipeline_version: Option<String>,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

/// A pipeline document, inline or from a file. Exactly one must be given;
/// a blank value counts as not given.
#[derive(Debug, Clone, clap::Args)]
pub struct PayloadArgs {
    /// Pipeline as JSON
    #[arg(long)]
    pub pipeline: Option<String>,
    /// File holding the pipeline as JSON
    #[arg(long)]
    pub pipeline_file: Option<PathBuf>,
}

impl PayloadArgs {
    fn pipeline(&self) -> Result<Pipeline> {
        let inline = self.pipeline.as_deref().filter(|text| !text.trim().is_empty());
        let file = self
            .pipeline_file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty());
        let text = match (inline, file) {
            (Some(_), Some(_)) => {
                return Err(Error::validation(
                    "Only one of '--pipeline-file' or '--pipeline' can be specified",
                ))
            },
            (None, None) => {
                return Err(Error::validation(
                    "One of '--pipeline-file' or '--pipeline' must be specified",
                ))
            },
            (Some(inline), None) => inline.to_string(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                Error::validation(format!("could not read '{}': {}", path.display(), e))
            })?,
        };

        serde_json::from_str(&text).map_err(|e| Error::validation(format!("invalid pipeline JSON: {}", e)))
    }
}

pub(super) async fn create(args: &CreateArgs, ctx: &Context) -> Result<ApiResponse<Pipeline>> {
    let group = required("--group", args.group.as_deref())?;
    let pipeline = args.payload.pipeline()?;

    let client = ctx.client()?;
    client.pipeline_configs().create(group, &pipeline).await
}

pub(super) async fn update(args: &UpdateArgs, ctx: &Context) -> Result<ApiResponse<Pipeline>> {
    let name = required("--name", args.name.as_deref())?;
    let version = required("--pipeline-version", args.pipeline_version.as_deref())?;
    let mut pipeline = args.payload.pipeline()?;
    pipeline.version = Some(version.to_string());
    if pipeline.name.is_empty() {
        pipeline.name = name.to_string();
    }

    let client = ctx.client()?;
    client.pipeline_configs().update(name, &pipeline).await
}

pub(super) async fn delete(args: &NameArgs, ctx: &Context) -> Result<ApiResponse<Message>> {
    let name = args.name()?;
    let client = ctx.client()?;
    client.pipeline_configs().delete(name).await
}

pub(super) async fn get(args: &NameArgs, ctx: &Context) -> Result<ApiResponse<Pipeline>> {
    let name = args.name()?;
    let client = ctx.client()?;
    let response = client.pipeline_configs().get(name).await?;
    Ok(response.map(|mut pipeline| {
        pipeline.remove_links();
        pipeline
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn payload(pipeline: Option<&str>, pipeline_file: Option<PathBuf>) -> PayloadArgs {
        PayloadArgs {
            pipeline: pipeline.map(str::to_string),
            pipeline_file,
        }
    }

    #[test]
    fn test_payload_exclusivity() {
        let err = payload(None, None).pipeline().unwrap_err();
        assert_eq!(
            err.to_string(),
            "One of '--pipeline-file' or '--pipeline' must be specified"
        );

        let err = payload(Some("{}"), Some(PathBuf::from("p.json"))).pipeline().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only one of '--pipeline-file' or '--pipeline' can be specified"
        );

        for blank in [payload(Some(""), None), payload(Some("  "), Some(PathBuf::new()))] {
            let err = blank.pipeline().unwrap_err();
            assert_eq!(
                err.to_string(),
                "One of '--pipeline-file' or '--pipeline' must be specified"
            );
        }
    }

    #[test]
    fn test_blank_inline_payload_defers_to_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "deploy", "materials": [], "stages": []}}"#).unwrap();

        let pipeline = payload(Some(""), Some(file.path().to_path_buf())).pipeline().unwrap();
        assert_eq!(pipeline.name, "deploy");
    }

    #[test]
    fn test_payload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "build", "materials": [], "stages": []}}"#).unwrap();

        let pipeline = payload(None, Some(file.path().to_path_buf())).pipeline().unwrap();
        assert_eq!(pipeline.name, "build");
    }

    #[test]
    fn test_payload_errors_are_validation() {
        let err = payload(Some("{not json"), None).pipeline().unwrap_err();
        assert!(err.to_string().starts_with("invalid pipeline JSON"));

        let err = payload(None, Some(PathBuf::from("/nonexistent/pipeline.json")))
            .pipeline()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
