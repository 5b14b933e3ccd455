use actix_session::Session;
use actix_web::{HttpResponse, web};
use tera::{Context, Tera};

use crate::AppState;
use crate::forms::{LoginForm, RegisterForm, check};
use crate::handlers::auth::{login, signup};
use crate::routes::{redirect, render};
use crate::session;

fn auth_page(tmpl: &Tera, name: &str, email: Option<&str>, error: Option<String>) -> HttpResponse {
    let mut context = Context::new();
    context.insert("email", email.unwrap_or(""));
    if let Some(error) = error {
        context.insert("error", &error);
    }
    render(tmpl, name, &context)
}

async fn show_login(tmpl: web::Data<Tera>, session: Session) -> HttpResponse {
    if session::load(&session).is_authenticated() {
        return redirect("/");
    }
    auth_page(&tmpl, "login.html", None, None)
}

async fn sign_in(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    session: Session,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let result = match check(&form) {
        Ok(()) => login(&state.api, &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(ctx) => {
            session.renew();
            if let Err(e) = session::persist(&session, &ctx) {
                log::error!("Failed to store session: {}", e);
                return HttpResponse::InternalServerError().body("Failed to store session");
            }
            redirect("/")
        }
        Err(error) => {
            log::warn!("Sign-in for {} rejected: {}", form.email, error);
            auth_page(&tmpl, "login.html", Some(&form.email), Some(error.user_message()))
        }
    }
}

async fn sign_out(state: web::Data<AppState>, session: Session) -> HttpResponse {
    if let Some(token) = session::load(&session).token() {
        state.caches.forget_owner(token);
    }
    session::clear(&session);
    redirect("/login")
}

async fn show_register(tmpl: web::Data<Tera>) -> HttpResponse {
    auth_page(&tmpl, "register.html", None, None)
}

async fn register(
    state: web::Data<AppState>,
    tmpl: web::Data<Tera>,
    form: web::Form<RegisterForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let result = match check(&form) {
        Ok(()) => signup(&state.api, &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            log::info!("Registered {}", form.email);
            redirect("/login")
        }
        Err(error) => auth_page(&tmpl, "register.html", Some(&form.email), Some(error.user_message())),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::get().to(show_login))
            .route(web::post().to(sign_in)),
    );
    cfg.route("/logout", web::post().to(sign_out));
    cfg.service(
        web::resource("/register")
            .route(web::get().to(show_register))
            .route(web::post().to(register)),
    );
}
