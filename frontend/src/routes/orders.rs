use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use tera::Tera;

use crate::AppState;
use crate::derived::OrderFilter;
use crate::error::ApiError;
use crate::forms::OrderStatusForm;
use crate::handlers::orders::update_order_status;
use crate::handlers::resource::Resource;
use crate::models::{Order, OrderStatus};
use crate::routes::collections::{list_context, load_page};
use crate::routes::{list_location, redirect, render};
use crate::session::RequestContext;
use crate::sync::reconcile::reconcile;

/// Filter inputs arrive as raw strings; an empty select means "any".
#[derive(Deserialize, Debug, Default)]
struct OrdersQuery {
    page: Option<u32>,
    date: Option<String>,
    status: Option<String>,
}

impl OrdersQuery {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            date: self.date.clone().filter(|d| !d.trim().is_empty()),
            status: self
                .status
                .as_deref()
                .and_then(|s| serde_json::from_value::<OrderStatus>(Value::from(s)).ok()),
        }
    }
}

async fn render_orders(
    state: &AppState,
    tmpl: &Tera,
    ctx: &RequestContext,
    query: &OrdersQuery,
    error: Option<&ApiError>,
) -> HttpResponse {
    let view = load_page::<Order>(state, ctx, query.page.unwrap_or(1)).await;

    // Only the fetched page is filtered; other pages are not searched.
    let filter = query.filter();
    let rows = filter.apply(view.items()).into_iter().map(Resource::row).collect();

    let mut context = list_context(&view, rows);
    context.insert(
        "statuses",
        &OrderStatus::ALL.iter().map(OrderStatus::as_str).collect::<Vec<_>>(),
    );
    context.insert("filter_date", filter.date.as_deref().unwrap_or(""));
    context.insert("filter_status", filter.status.map(|s| s.as_str()).unwrap_or(""));
    if let Some(error) = error {
        context.insert("error", &error.user_message());
    }
    render(tmpl, "orders.html", &context)
}

async fn list(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    query: web::Query<OrdersQuery>,
) -> HttpResponse {
    render_orders(&state, &tmpl, &ctx, &query, None).await
}

async fn change_status(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<OrdersQuery>,
    form: web::Form<OrderStatusForm>,
) -> HttpResponse {
    let id = path.into_inner();
    let outcome = reconcile(
        state.caches.of::<Order>(),
        update_order_status(&state.api, &ctx, &id, form.status),
    )
    .await;

    match outcome {
        Ok(()) => redirect(&list_location(Order::PATH, query.page)),
        Err(error) => render_orders(&state, &tmpl, &ctx, &query, Some(&error)).await,
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::get().to(list));
    cfg.route("/orders/{id}/status", web::post().to(change_status));
}
