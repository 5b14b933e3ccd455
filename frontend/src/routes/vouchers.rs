use actix_session::Session;
use actix_web::{HttpResponse, web};
use tera::Tera;

use crate::AppState;
use crate::forms::VoucherStatusForm;
use crate::handlers::resource::Resource;
use crate::handlers::vouchers::update_voucher_status;
use crate::models::{PageQuery, Voucher};
use crate::routes::collections::render_editable;
use crate::routes::{list_location, redirect};
use crate::session::RequestContext;
use crate::sync::reconcile::reconcile;

/// Activates or deactivates a voucher.
async fn change_status(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    form: web::Form<VoucherStatusForm>,
) -> HttpResponse {
    let id = path.into_inner();
    let outcome = reconcile(
        state.caches.of::<Voucher>(),
        update_voucher_status(&state.api, &ctx, &id, form.status),
    )
    .await;

    match outcome {
        Ok(()) => redirect(&list_location(Voucher::PATH, query.page)),
        Err(error) => {
            render_editable::<Voucher>(&state, &tmpl, &session, &ctx, &query, Some(&error), None)
                .await
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/vouchers/{id}/status", web::post().to(change_status));
}
