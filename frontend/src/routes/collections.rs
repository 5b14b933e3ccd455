//! List, create, edit and delete pages shared by every resource.

use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tera::{Context, Tera};

use crate::AppState;
use crate::error::ApiError;
use crate::forms::{ConfirmForm, check};
use crate::handlers::resource::{self, Editable, Resource};
use crate::models::PageQuery;
use crate::routes::{FormField, form_fields, list_location, redirect, render, table_rows};
use crate::session::{RequestContext, draft_key};
use crate::sync::cache::CollectionKey;
use crate::sync::draft::{BeginEdit, EditState};
use crate::sync::reconcile::{Confirmation, confirmed_delete, reconcile};
use crate::sync::view::CollectionView;
use crate::sync::{Caches, HasCache};

/// Reload attempts after an out-of-range page, in case the collection
/// shrinks between fetches.
const MAX_PAGE_RELOADS: usize = 2;

/// Fetches (or reads from cache) one page of `R` into a fresh view. A page
/// past the end is dropped from the cache and the last page is shown.
pub async fn load_page<R>(state: &AppState, ctx: &RequestContext, page: u32) -> CollectionView<R>
where
    R: Resource,
    Caches: HasCache<R>,
{
    let cache = state.caches.of::<R>();
    let mut view = CollectionView::new();
    let mut page = page;

    for _ in 0..=MAX_PAGE_RELOADS {
        let ticket = view.request_page(page);
        let key = CollectionKey::page(R::PATH, ticket.page()).owned_by(ctx.token());
        let api = state.api.clone();
        let fetch_ctx = ctx.clone();
        let snapshot = cache
            .load(key.clone(), move || async move {
                resource::fetch_page::<R>(&api, &fetch_ctx, ticket.page()).await
            })
            .await;
        view.apply(ticket, &snapshot);
        if !view.needs_reload() {
            break;
        }
        log::debug!("{} is past the last page {}", key, view.current_page());
        cache.evict(&key);
        page = view.current_page();
    }
    view
}

/// Title, columns, rows and pager of a list page.
pub fn list_context<R: Resource>(view: &CollectionView<R>, rows: Vec<Value>) -> Context {
    let mut context = Context::new();
    context.insert("title", R::TITLE);
    context.insert("path", R::PATH);
    context.insert("columns", R::COLUMNS);
    context.insert("rows", &table_rows(R::COLUMNS, rows));
    context.insert("pagination", &view.pagination());
    if let Some(error) = view.error() {
        context.insert("load_error", error);
    }
    context
}

pub fn load_edit_state<D: DeserializeOwned>(session: &Session, path: &str) -> EditState<D> {
    match session.get::<EditState<D>>(&draft_key(path)) {
        Ok(Some(state)) => state,
        Ok(None) => EditState::Idle,
        Err(e) => {
            log::warn!("Dropping unreadable draft for {}: {}", path, e);
            EditState::Idle
        }
    }
}

pub fn store_edit_state<D: Serialize>(session: &Session, path: &str, state: &EditState<D>) {
    let key = draft_key(path);
    if matches!(state, EditState::Idle) {
        session.remove(&key);
        return;
    }
    if let Err(e) = session.insert(key, state) {
        log::warn!("Could not keep draft for {}: {}", path, e);
    }
}

#[derive(Serialize)]
struct ConflictNotice<'a> {
    pending_id: &'a str,
    target_id: &'a str,
}

/// Edit and create forms of an editable list. `decorate` adjusts the inputs,
/// e.g. select options for lookups.
pub fn edit_context<R, F>(
    context: &mut Context,
    session: &Session,
    view: &CollectionView<R>,
    query: &PageQuery,
    create_values: Option<&R::Draft>,
    decorate: F,
) where
    R: Editable,
    F: Fn(&mut Vec<FormField>),
{
    let mut state = load_edit_state::<R::Draft>(session, R::PATH);

    if let Some(target) = query.edit.as_deref() {
        match view.items().iter().find(|item| item.id() == target) {
            Some(item) => match state.begin(target, item.draft(), query.discard_confirmed()) {
                BeginEdit::Conflict { pending_id } => {
                    context.insert(
                        "conflict",
                        &ConflictNotice {
                            pending_id: &pending_id,
                            target_id: target,
                        },
                    );
                }
                BeginEdit::Started | BeginEdit::Resumed => {
                    store_edit_state(session, R::PATH, &state);
                }
            },
            None => context.insert("error", &format!("{} is not on this page", target)),
        }
    }

    if let EditState::Editing { id, draft, .. } = &state {
        let mut fields = form_fields(draft);
        decorate(&mut fields);
        context.insert("editing_id", id);
        context.insert("edit_fields", &fields);
    }

    if R::CREATABLE {
        let blank = R::Draft::default();
        let mut fields = form_fields(create_values.unwrap_or(&blank));
        decorate(&mut fields);
        context.insert("create_fields", &fields);
    }
}

pub async fn render_editable<R>(
    state: &AppState,
    tmpl: &Tera,
    session: &Session,
    ctx: &RequestContext,
    query: &PageQuery,
    error: Option<&ApiError>,
    create_values: Option<&R::Draft>,
) -> HttpResponse
where
    R: Editable,
    Caches: HasCache<R>,
{
    let view = load_page::<R>(state, ctx, query.page.unwrap_or(1)).await;
    let rows = view.items().iter().map(Resource::row).collect();
    let mut context = list_context(&view, rows);
    edit_context::<R, _>(&mut context, session, &view, query, create_values, |_| {});
    if let Some(error) = error {
        context.insert("error", &error.user_message());
    }
    render(tmpl, "collection.html", &context)
}

pub async fn list<R>(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    query: web::Query<PageQuery>,
) -> HttpResponse
where
    R: Editable,
    Caches: HasCache<R>,
{
    render_editable::<R>(&state, &tmpl, &session, &ctx, &query, None, None).await
}

pub async fn create<R>(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    form: web::Form<R::Draft>,
) -> HttpResponse
where
    R: Editable,
    Caches: HasCache<R>,
{
    let draft = form.into_inner();
    let query = PageQuery::default();

    let outcome = match check(&draft) {
        Ok(()) => {
            reconcile(
                state.caches.of::<R>(),
                resource::create::<R>(&state.api, &ctx, &draft),
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => redirect(&list_location(R::PATH, None)),
        Err(error) => {
            render_editable::<R>(&state, &tmpl, &session, &ctx, &query, Some(&error), Some(&draft))
                .await
        }
    }
}

/// Another row of the list holds unsaved changes; the submission was not
/// recorded and nothing may be sent.
#[derive(Debug)]
pub struct DraftConflict {
    pub pending_id: String,
}

impl DraftConflict {
    pub fn error(&self) -> ApiError {
        ApiError::Validation(format!(
            "Unsaved changes on {} must be saved or discarded first",
            self.pending_id
        ))
    }

    /// Re-opens `id`, which renders the discard prompt.
    pub fn reopen(&self, id: &str, page: Option<u32>) -> PageQuery {
        PageQuery {
            page,
            edit: Some(id.to_string()),
            discard: None,
        }
    }
}

/// Records the submitted fields as the row's draft and returns the edit
/// state. A dirty draft of another row is never replaced.
pub fn record_draft<R: Editable>(
    session: &Session,
    id: &str,
    draft: &R::Draft,
) -> Result<EditState<R::Draft>, DraftConflict> {
    let mut edit = load_edit_state::<R::Draft>(session, R::PATH);
    if !edit.update(id, draft.clone()) {
        // No open draft for this row (expired session or a second tab).
        if let BeginEdit::Conflict { pending_id } = edit.begin(id, draft.clone(), false) {
            log::info!("Refusing to replace the draft of {} with {}", pending_id, id);
            return Err(DraftConflict { pending_id });
        }
    }
    store_edit_state(session, R::PATH, &edit);
    Ok(edit)
}

pub fn finish_draft<R: Editable>(session: &Session, mut edit: EditState<R::Draft>) {
    edit.commit();
    store_edit_state(session, R::PATH, &edit);
}

pub async fn save<R>(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    form: web::Form<R::Draft>,
) -> HttpResponse
where
    R: Editable,
    Caches: HasCache<R>,
{
    let id = path.into_inner();
    let draft = form.into_inner();
    let edit = match record_draft::<R>(&session, &id, &draft) {
        Ok(edit) => edit,
        Err(conflict) => {
            let reopen = conflict.reopen(&id, query.page);
            return render_editable::<R>(
                &state,
                &tmpl,
                &session,
                &ctx,
                &reopen,
                Some(&conflict.error()),
                None,
            )
            .await;
        }
    };

    let outcome = match check(&draft) {
        Ok(()) => {
            reconcile(
                state.caches.of::<R>(),
                resource::update::<R>(&state.api, &ctx, &id, &draft),
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            finish_draft::<R>(&session, edit);
            redirect(&list_location(R::PATH, query.page))
        }
        Err(error) => {
            render_editable::<R>(&state, &tmpl, &session, &ctx, &query, Some(&error), None).await
        }
    }
}

pub async fn cancel<R>(
    session: Session,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HttpResponse
where
    R: Editable,
{
    let mut edit = load_edit_state::<R::Draft>(&session, R::PATH);
    if edit.editing_id() == Some(path.as_str()) {
        edit.cancel();
        store_edit_state(&session, R::PATH, &edit);
    }
    redirect(&list_location(R::PATH, query.page))
}

fn confirm_context<R: Resource>(id: &str, page: Option<u32>) -> Context {
    let mut context = Context::new();
    context.insert("title", R::TITLE);
    context.insert("path", R::PATH);
    context.insert("id", id);
    context.insert("page", &page.unwrap_or(1));
    context
}

pub async fn confirm_delete<R>(
    tmpl: web::Data<Tera>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HttpResponse
where
    R: Resource,
{
    render(
        &tmpl,
        "confirm_delete.html",
        &confirm_context::<R>(&path, query.page),
    )
}

pub async fn delete<R>(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    form: web::Form<ConfirmForm>,
) -> HttpResponse
where
    R: Resource,
    Caches: HasCache<R>,
{
    let id = path.into_inner();
    let confirmation = Confirmation::from_answer(form.confirm.as_deref());

    let outcome = confirmed_delete(state.caches.of::<R>(), confirmation, || {
        resource::delete::<R>(&state.api, &ctx, &id)
    })
    .await;

    match outcome {
        Ok(_) => redirect(&list_location(R::PATH, query.page)),
        Err(error) => {
            let mut context = confirm_context::<R>(&id, query.page);
            context.insert("error", &error.user_message());
            render(&tmpl, "confirm_delete.html", &context)
        }
    }
}
