use reqwest::Method;
use serde_json::json;

use crate::error::ApiResult;
use crate::handlers::client::ApiClient;
use crate::models::OrderStatus;
use crate::session::RequestContext;

/// `PATCH /orders/:id` with only the new status.
pub async fn update_order_status(
    api: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    status: OrderStatus,
) -> ApiResult<()> {
    let path = ApiClient::item_path("orders", id);
    api.send_json(ctx, Method::PATCH, &path, &json!({ "status": status }))
        .await?;
    log::info!("Order {} moved to {}", id, status.as_str());
    Ok(())
}
