//! Server-rendered administration dashboard for the shop REST API.

use actix_files::Files;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use tera::Tera;

pub mod config;
pub mod derived;
pub mod envelope;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod session;
pub mod sync;

use config::AdminConfig;
use handlers::ApiClient;
use sync::Caches;

/// Shared by every worker: the backend client and one cache per resource.
pub struct AppState {
    pub api: ApiClient,
    pub caches: Caches,
}

impl AppState {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            caches: Caches::default(),
        }
    }
}

fn session_key(config: &AdminConfig) -> anyhow::Result<Key> {
    match &config.session_secret {
        Some(secret) => Key::try_from(secret.as_bytes()).context("invalid SESSION_SECRET"),
        None => {
            log::warn!("SESSION_SECRET not set; sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

pub async fn run(config: AdminConfig) -> anyhow::Result<()> {
    let tera = Tera::new(&config.templates)
        .with_context(|| format!("failed to load templates from {}", config.templates))?;
    let key = session_key(&config)?;
    let state = web::Data::new(AppState::new(ApiClient::new(config.api_base_url.clone())));
    let tera = web::Data::new(tera);

    log::info!(
        "Starting admin dashboard on {}:{} against {}",
        config.address,
        config.port,
        config.api_base_url
    );

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(tera.clone())
            .service(Files::new("/static", "./static"))
            .configure(routes::configure)
    })
    .bind((config.address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
