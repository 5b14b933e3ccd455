use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{HttpResponse, web};
use tera::Tera;

use crate::AppState;
use crate::derived::join_products;
use crate::error::ApiError;
use crate::forms::{ProductDraft, check};
use crate::handlers::products::{create_product, update_product};
use crate::handlers::resource::{self, Resource};
use crate::models::{Brand, Category, PageQuery, Product};
use crate::routes::collections::{edit_context, finish_draft, list_context, load_page, record_draft};
use crate::routes::uploads::read_multipart;
use crate::routes::{FormField, SelectOption, list_location, redirect, render};
use crate::session::RequestContext;
use crate::sync::cache::CollectionKey;
use crate::sync::reconcile::reconcile;
use crate::sync::{Caches, HasCache};

/// Whole lookup collection, cached under the caller's `all` key.
pub async fn lookup<R>(state: &AppState, ctx: &RequestContext) -> Vec<R>
where
    R: Resource,
    Caches: HasCache<R>,
{
    let key = CollectionKey::all(R::PATH).owned_by(ctx.token());
    let api = state.api.clone();
    let ctx = ctx.clone();
    let snapshot = state
        .caches
        .of::<R>()
        .load(key, move || async move {
            resource::fetch_all::<R>(&api, &ctx).await
        })
        .await;
    snapshot
        .listing
        .map(|listing| listing.items.clone())
        .unwrap_or_default()
}

fn select_options<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<SelectOption> {
    let mut options = vec![SelectOption {
        value: String::new(),
        label: "-".to_string(),
    }];
    options.extend(items.map(|(value, label)| SelectOption {
        value: value.to_string(),
        label: label.to_string(),
    }));
    options
}

async fn render_products(
    state: &AppState,
    tmpl: &Tera,
    session: &Session,
    ctx: &RequestContext,
    query: &PageQuery,
    error: Option<&ApiError>,
    create_values: Option<&ProductDraft>,
) -> HttpResponse {
    let view = load_page::<Product>(state, ctx, query.page.unwrap_or(1)).await;
    let brands = lookup::<Brand>(state, ctx).await;
    let categories = lookup::<Category>(state, ctx).await;

    let rows = join_products(view.items(), &brands, &categories)
        .iter()
        .filter_map(|row| serde_json::to_value(row).ok())
        .collect();
    let mut context = list_context(&view, rows);
    context.insert("multipart", &true);

    let decorate = |fields: &mut Vec<FormField>| {
        for field in fields.iter_mut() {
            field.options = match field.name.as_str() {
                "brandId" => Some(select_options(
                    brands.iter().map(|b| (b.id.as_str(), b.name.as_str())),
                )),
                "categoryId" => Some(select_options(
                    categories.iter().map(|c| (c.id.as_str(), c.name.as_str())),
                )),
                _ => continue,
            };
        }
    };
    edit_context::<Product, _>(&mut context, session, &view, query, create_values, decorate);

    if let Some(error) = error {
        context.insert("error", &error.user_message());
    }
    render(tmpl, "collection.html", &context)
}

async fn list(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    render_products(&state, &tmpl, &session, &ctx, &query, None, None).await
}

async fn create(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let (fields, images) = read_multipart(payload).await?;
    let draft = ProductDraft::from_fields(&fields);

    let outcome = match check(&draft) {
        Ok(()) => {
            reconcile(
                state.caches.of::<Product>(),
                create_product(&state.api, &ctx, &draft, &images),
            )
            .await
        }
        Err(e) => Err(e),
    };

    Ok(match outcome {
        Ok(()) => redirect(&list_location(Product::PATH, None)),
        Err(error) => {
            let query = PageQuery::default();
            render_products(&state, &tmpl, &session, &ctx, &query, Some(&error), Some(&draft)).await
        }
    })
}

async fn save(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    let (fields, images) = read_multipart(payload).await?;
    let draft = ProductDraft::from_fields(&fields);
    let edit = match record_draft::<Product>(&session, &id, &draft) {
        Ok(edit) => edit,
        Err(conflict) => {
            let reopen = conflict.reopen(&id, query.page);
            let error = conflict.error();
            return Ok(
                render_products(&state, &tmpl, &session, &ctx, &reopen, Some(&error), None).await,
            );
        }
    };

    let outcome = match check(&draft) {
        Ok(()) => {
            reconcile(
                state.caches.of::<Product>(),
                update_product(&state.api, &ctx, &id, &draft, &images),
            )
            .await
        }
        Err(e) => Err(e),
    };

    Ok(match outcome {
        Ok(()) => {
            finish_draft::<Product>(&session, edit);
            redirect(&list_location(Product::PATH, query.page))
        }
        Err(error) => render_products(&state, &tmpl, &session, &ctx, &query, Some(&error), None).await,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/products")
            .route(web::get().to(list))
            .route(web::post().to(create)),
    );
    cfg.service(web::resource("/products/{id}").route(web::post().to(save)));
}
