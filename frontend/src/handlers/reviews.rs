//! Admin replies live under the review they answer.

use reqwest::Method;

use crate::error::ApiResult;
use crate::forms::ReplyForm;
use crate::handlers::client::ApiClient;
use crate::session::RequestContext;

fn replies_path(review_id: &str) -> String {
    format!("{}/admin-replies", ApiClient::item_path("product-reviews", review_id))
}

pub async fn create_reply(
    api: &ApiClient,
    ctx: &RequestContext,
    review_id: &str,
    reply: &ReplyForm,
) -> ApiResult<()> {
    api.send_json(ctx, Method::POST, &replies_path(review_id), reply)
        .await?;
    Ok(())
}

pub async fn update_reply(
    api: &ApiClient,
    ctx: &RequestContext,
    review_id: &str,
    reply: &ReplyForm,
) -> ApiResult<()> {
    api.send_json(ctx, Method::PATCH, &replies_path(review_id), reply)
        .await?;
    Ok(())
}

pub async fn delete_reply(api: &ApiClient, ctx: &RequestContext, review_id: &str) -> ApiResult<()> {
    api.delete(ctx, &replies_path(review_id)).await?;
    Ok(())
}
