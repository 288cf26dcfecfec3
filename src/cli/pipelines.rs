//! Pipeline status and scheduling commands.

use super::{required, Context, NameArgs};
use crate::client::ApiResponse;
use crate::error::Result;
use crate::models::{Message, PipelineStatus};

/// Flags of `pause-pipeline`.
#[derive(Debug, Clone, clap::Args)]
pub struct PauseArgs {
    #[arg(long)]
    pub name: Option<String>,
    /// Reason shown in the dashboard
    #[arg(long, default_value = "")]
    pub cause: String,
}

pub(super) async fn status(args: &NameArgs, ctx: &Context) -> Result<ApiResponse<PipelineStatus>> {
    let name = args.name()?;
    ctx.client()?.pipelines().status(name).await
}

pub(super) async fn pause(args: &PauseArgs, ctx: &Context) -> Result<ApiResponse<Message>> {
    let name = required("--name", args.name.as_deref())?;
    ctx.client()?.pipelines().pause(name, &args.cause).await
}

pub(super) async fn unpause(args: &NameArgs, ctx: &Context) -> Result<ApiResponse<Message>> {
    let name = args.name()?;
    ctx.client()?.pipelines().unpause(name).await
}
