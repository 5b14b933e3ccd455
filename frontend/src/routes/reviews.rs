use actix_web::{HttpResponse, web};
use serde::Serialize;
use tera::Tera;

use crate::AppState;
use crate::error::ApiError;
use crate::forms::{ConfirmForm, ReplyForm, check};
use crate::handlers::resource::Resource;
use crate::handlers::reviews::{create_reply, delete_reply, update_reply};
use crate::models::{PageQuery, Review};
use crate::routes::collections::{list_context, load_page};
use crate::routes::{TableRow, list_location, redirect, render, table_rows};
use crate::session::RequestContext;
use crate::sync::reconcile::{Confirmation, confirmed_delete, reconcile};

/// Table row plus the current admin reply, which prefills the reply form.
#[derive(Serialize)]
struct ReviewRow<'a> {
    #[serde(flatten)]
    row: TableRow,
    reply: Option<&'a str>,
}

async fn render_reviews(
    state: &AppState,
    tmpl: &Tera,
    ctx: &RequestContext,
    page: Option<u32>,
    error: Option<&ApiError>,
) -> HttpResponse {
    let view = load_page::<Review>(state, ctx, page.unwrap_or(1)).await;
    let rows: Vec<_> = view.items().iter().map(Resource::row).collect();
    let mut context = list_context(&view, Vec::new());

    let review_rows: Vec<ReviewRow> = table_rows(Review::COLUMNS, rows)
        .into_iter()
        .zip(view.items())
        .map(|(row, review)| ReviewRow {
            row,
            reply: review.admin_reply.as_ref().map(|r| r.content.as_str()),
        })
        .collect();
    context.insert("rows", &review_rows);
    if let Some(error) = error {
        context.insert("error", &error.user_message());
    }
    render(tmpl, "reviews.html", &context)
}

async fn list(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    render_reviews(&state, &tmpl, &ctx, query.page, None).await
}

/// Posts a new reply, or patches the existing one.
async fn reply(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    form: web::Form<ReplyForm>,
) -> HttpResponse {
    let id = path.into_inner();
    let form = form.into_inner();

    let outcome = match check(&form) {
        Ok(()) if form.existing => {
            reconcile(
                state.caches.of::<Review>(),
                update_reply(&state.api, &ctx, &id, &form),
            )
            .await
        }
        Ok(()) => {
            reconcile(
                state.caches.of::<Review>(),
                create_reply(&state.api, &ctx, &id, &form),
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => redirect(&list_location(Review::PATH, query.page)),
        Err(error) => render_reviews(&state, &tmpl, &ctx, query.page, Some(&error)).await,
    }
}

async fn remove_reply(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    form: web::Form<ConfirmForm>,
) -> HttpResponse {
    let id = path.into_inner();
    let confirmation = Confirmation::from_answer(form.confirm.as_deref());

    let outcome = confirmed_delete(state.caches.of::<Review>(), confirmation, || {
        delete_reply(&state.api, &ctx, &id)
    })
    .await;

    match outcome {
        Ok(_) => redirect(&list_location(Review::PATH, query.page)),
        Err(error) => render_reviews(&state, &tmpl, &ctx, query.page, Some(&error)).await,
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/reviews", web::get().to(list));
    cfg.route("/reviews/{id}/reply", web::post().to(reply));
    cfg.route("/reviews/{id}/reply/delete", web::post().to(remove_reply));
}
