use serde::Serialize;

use crate::derived::{ChartWindow, Granularity};
use crate::envelope::unwrap_data;
use crate::error::{ApiError, ApiResult};
use crate::handlers::client::ApiClient;
use crate::models::DashboardStats;
use crate::session::RequestContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardQuery {
    filter_type: Granularity,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<u32>,
}

/// `GET /admin/dashboard`; totals plus the sparse revenue series.
pub async fn fetch_dashboard(
    api: &ApiClient,
    ctx: &RequestContext,
    window: &ChartWindow,
) -> ApiResult<DashboardStats> {
    let query = DashboardQuery {
        filter_type: window.granularity,
        year: window.year,
        month: (window.granularity == Granularity::Day).then_some(window.month),
    };
    let body = api.get(ctx, "admin/dashboard", &query).await?;
    serde_json::from_value(unwrap_data(body))
        .map_err(|e| ApiError::Malformed(format!("dashboard: {}", e)))
}
