//! Agent commands.

use super::{required, Context};
use crate::client::ApiResponse;
use crate::error::Result;
use crate::models::Agent;

/// Flags of `get-agent`.
#[derive(Debug, Clone, clap::Args)]
pub struct GetArgs {
    #[arg(long)]
    pub uuid: Option<String>,
}

pub(super) async fn list(ctx: &Context) -> Result<ApiResponse<Vec<Agent>>> {
    ctx.client()?.agents().list().await
}

pub(super) async fn get(args: &GetArgs, ctx: &Context) -> Result<ApiResponse<Agent>> {
    let uuid = required("--uuid", args.uuid.as_deref())?;
    ctx.client()?.agents().get(uuid).await
}
