//! Job commands.

use super::Context;
use crate::client::ApiResponse;
use crate::error::Result;
use crate::models::ScheduledJob;

pub(super) async fn list_scheduled(ctx: &Context) -> Result<ApiResponse<Vec<ScheduledJob>>> {
    ctx.client()?.jobs().list_scheduled().await
}
