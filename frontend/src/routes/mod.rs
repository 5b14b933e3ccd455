use actix_session::SessionExt;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::{Next, from_fn};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};

use crate::handlers::resource::{Column, Editable, Resource};
use crate::models::{Brand, Category, News, User, Voucher};
use crate::session;
use crate::sync::{Caches, HasCache};

pub mod auth;
pub mod collections;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod vouchers;

/// Renders a template, logging and answering 500 when Tera fails.
pub fn render(tmpl: &Tera, name: &str, context: &Context) -> HttpResponse {
    match tmpl.render(name, context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(err) => {
            log::error!("Tera render error in {}: {:?}", name, err);
            HttpResponse::InternalServerError().body("Template render error")
        }
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", location))
        .finish()
}

pub fn list_location(path: &str, page: Option<u32>) -> String {
    match page {
        Some(page) if page > 1 => format!("/{}?page={}", path, page),
        _ => format!("/{}", path),
    }
}

/// One table row as the templates see it.
#[derive(Debug, Serialize)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<String>,
    pub status: Option<String>,
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn table_rows(columns: &[Column], rows: Vec<Value>) -> Vec<TableRow> {
    rows.into_iter()
        .map(|row| TableRow {
            id: cell_text(&row["_id"]),
            cells: columns.iter().map(|c| cell_text(&row[c.key])).collect(),
            status: row["status"].as_str().map(str::to_string),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub options: Option<Vec<SelectOption>>,
}

/// One input per draft field.
pub fn form_fields<D: Serialize>(draft: &D) -> Vec<FormField> {
    match serde_json::to_value(draft) {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| FormField {
                name: name.clone(),
                value: cell_text(value),
                options: None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

async fn require_sign_in<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    if session::load(&req.get_session()).is_authenticated() {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }
    let (req, _) = req.into_parts();
    Ok(ServiceResponse::new(req, redirect("/login")).map_into_right_body())
}

/// Registers the generic list/create/edit/delete routes of `R`.
fn editable<R>(cfg: &mut web::ServiceConfig)
where
    R: Editable,
    Caches: HasCache<R>,
{
    let base = format!("/{}", R::PATH);
    cfg.service(
        web::resource(base.clone())
            .route(web::get().to(collections::list::<R>))
            .route(web::post().to(collections::create::<R>)),
    );
    cfg.service(web::resource(format!("{base}/{{id}}")).route(web::post().to(collections::save::<R>)));
    cancel_and_delete::<R>(cfg);
}

fn cancel_and_delete<R>(cfg: &mut web::ServiceConfig)
where
    R: Editable,
    Caches: HasCache<R>,
{
    let base = format!("/{}", R::PATH);
    cfg.service(
        web::resource(format!("{base}/{{id}}/cancel")).route(web::post().to(collections::cancel::<R>)),
    );
    deletable::<R>(cfg);
}

fn deletable<R>(cfg: &mut web::ServiceConfig)
where
    R: Resource,
    Caches: HasCache<R>,
{
    cfg.service(
        web::resource(format!("/{}/{{id}}/delete", R::PATH))
            .route(web::get().to(collections::confirm_delete::<R>))
            .route(web::post().to(collections::delete::<R>)),
    );
}

fn protected(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(dashboard::show_dashboard));

    products::configure(cfg);
    cancel_and_delete::<crate::models::Product>(cfg);

    orders::configure(cfg);
    deletable::<crate::models::Order>(cfg);

    reviews::configure(cfg);
    deletable::<crate::models::Review>(cfg);

    vouchers::configure(cfg);
    editable::<Voucher>(cfg);

    editable::<Brand>(cfg);
    editable::<Category>(cfg);
    editable::<User>(cfg);
    editable::<News>(cfg);
}

/// All routes of the dashboard. Everything but sign-in and sign-up requires a
/// session token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    auth::configure(cfg);
    cfg.service(web::scope("").wrap(from_fn(require_sign_in)).configure(protected));
}
