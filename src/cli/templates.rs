//! Pipeline template commands.

use super::{Context, NameArgs};
use crate::client::ApiResponse;
use crate::error::Result;
use crate::models::{PipelineTemplate, TemplateSummary};

pub(super) async fn list(ctx: &Context) -> Result<ApiResponse<Vec<TemplateSummary>>> {
    ctx.client()?.templates().list().await
}

pub(super) async fn get(args: &NameArgs, ctx: &Context) -> Result<ApiResponse<PipelineTemplate>> {
    let name = args.name()?;
    let response = ctx.client()?.templates().get(name).await?;
    Ok(response.map(|mut template| {
        template.remove_links();
        template
    }))
}
