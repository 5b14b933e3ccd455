use reqwest::Method;
use serde_json::json;

use crate::error::ApiResult;
use crate::handlers::client::ApiClient;
use crate::models::ActiveStatus;
use crate::session::RequestContext;

pub async fn update_voucher_status(
    api: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    status: ActiveStatus,
) -> ApiResult<()> {
    let path = format!("{}/status", ApiClient::item_path("vouchers", id));
    api.send_json(ctx, Method::PATCH, &path, &json!({ "status": status }))
        .await?;
    Ok(())
}
