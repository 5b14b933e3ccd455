use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::json;
use shop_admin::handlers::ApiClient;
use shop_admin::{AppState, routes};
use tera::Tera;
use wiremock::matchers::{body_partial_json, header as has_header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn templates() -> Tera {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).unwrap()
}

macro_rules! admin_app {
    ($server:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new(AppState::new(ApiClient::new($server.uri()))))
                .app_data(web::Data::new(templates()))
                .configure(routes::configure),
        )
        .await
    };
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "token": "tok-9",
            "data": { "user": { "_id": "admin-1" } }
        })))
        .mount(server)
        .await;
}

fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Keeps the cookie up to date; the session store re-issues it on every change.
fn refresh_cookie<B>(cookie: &mut Cookie<'static>, resp: &ServiceResponse<B>) {
    if let Some(updated) = resp.response().cookies().next() {
        *cookie = updated.into_owned();
    }
}

macro_rules! sign_in {
    ($app:expr, $email:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri("/login")
                .set_form([("email", $email), ("password", "secret")])
                .to_request(),
        )
        .await;
        assert_eq!(location(&resp), "/", "sign-in of {}", $email);
        let cookie: Cookie<'static> = resp
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned();
        cookie
    }};
}

macro_rules! get_page {
    ($app:expr, $cookie:expr, $uri:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::get()
                .uri($uri)
                .cookie($cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", $uri);
        refresh_cookie(&mut $cookie, &resp);
        String::from_utf8_lossy(&test::read_body(resp).await).into_owned()
    }};
}

macro_rules! post_form {
    ($app:expr, $cookie:expr, $uri:expr, $form:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri($uri)
                .cookie($cookie.clone())
                .set_form($form)
                .to_request(),
        )
        .await;
        refresh_cookie(&mut $cookie, &resp);
        let status = resp.status();
        let to = location(&resp).to_string();
        let body = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
        (status, to, body)
    }};
}

fn brands_body(ids: &[&str], results: u64) -> serde_json::Value {
    let brands: Vec<_> = ids
        .iter()
        .map(|id| json!({ "_id": id, "name": format!("Brand {id}") }))
        .collect();
    json!({ "status": "success", "data": { "brands": brands, "results": results } })
}

#[actix_web::test]
async fn anonymous_requests_are_sent_to_sign_in() {
    let server = MockServer::start().await;
    let app = admin_app!(server);

    for uri in ["/", "/brands", "/orders?page=2"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), "/login");
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn signed_in_admin_sees_lists_and_declined_delete_sends_nothing() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/brands"))
        .and(has_header("authorization", "Bearer tok-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "brands": [{ "_id": "b1", "name": "Acme" }], "results": 1 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let app = admin_app!(server);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "admin@example.com"), ("password", "secret")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let cookie: Cookie<'static> = resp
        .response()
        .cookies()
        .next()
        .expect("session cookie")
        .into_owned();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/brands")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Acme"));

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/brands/b1/delete")
            .cookie(cookie)
            .set_form([("confirm", "no")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/brands");
}

#[actix_web::test]
async fn rejected_sign_in_shows_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Wrong password" })),
        )
        .mount(&server)
        .await;

    let app = admin_app!(server);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "admin@example.com"), ("password", "nope")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Wrong password"));
}

#[actix_web::test]
async fn lists_cached_for_one_session_are_not_served_to_another() {
    let server = MockServer::start().await;
    for (email, token) in [("admin@example.com", "admin-tok"), ("shopper@example.com", "user-tok")] {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_partial_json(json!({ "email": email })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(has_header("authorization", "Bearer admin-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "users": [{
                    "_id": "u1",
                    "name": "SECRETNAME",
                    "email": "secret@example.com",
                    "role": "admin",
                    "status": "active"
                }],
                "results": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(has_header("authorization", "Bearer user-tok"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Admins only" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = admin_app!(server);
    let mut admin = sign_in!(app, "admin@example.com");
    let mut shopper = sign_in!(app, "shopper@example.com");

    assert!(get_page!(app, admin, "/users").contains("SECRETNAME"));

    let body = get_page!(app, shopper, "/users");
    assert!(!body.contains("SECRETNAME"));
    assert!(body.contains("Admins only"));
}

#[actix_web::test]
async fn page_past_the_end_shows_the_last_page() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/brands"))
        .and(query_param("page", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brands_body(&[], 25)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/brands"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brands_body(&["b21", "b25"], 25)))
        .expect(1)
        .mount(&server)
        .await;

    let app = admin_app!(server);
    let mut cookie = sign_in!(app, "admin@example.com");

    let body = get_page!(app, cookie, "/brands?page=9");
    assert!(body.contains("Page 3 of 3"));
    assert!(body.contains("Brand b21"));
    assert!(body.contains("Brand b25"));
    assert!(!body.contains("Nothing here yet."));
}

#[actix_web::test]
async fn edit_save_cancel_and_discard_go_through_the_session_draft() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brands_body(&["b1", "b2"], 2)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/brands/b1"))
        .and(body_partial_json(json!({ "name": "Renamed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/brands/b2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = admin_app!(server);
    let mut cookie = sign_in!(app, "admin@example.com");

    let body = get_page!(app, cookie, "/brands?edit=b1");
    assert!(body.contains("/brands/b1/cancel?page=1"));

    // A rejected save keeps the unsaved draft of b1.
    let (status, _, body) = post_form!(app, cookie, "/brands/b1?page=1", [("name", "  ")]);
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Name must not be empty"));

    let body = get_page!(app, cookie, "/brands?edit=b2");
    assert!(body.contains("Unsaved changes on b1 will be lost."));
    assert!(body.contains("/brands/b1/cancel?page=1"));

    // Posting another row does not replace the pending draft.
    let (status, _, body) = post_form!(app, cookie, "/brands/b2?page=1", [("name", "Other")]);
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unsaved changes on b1 must be saved or discarded first"));
    assert!(body.contains("Unsaved changes on b1 will be lost."));

    let body = get_page!(app, cookie, "/brands?edit=b2&discard=1");
    assert!(body.contains("/brands/b2/cancel?page=1"));
    assert!(!body.contains("/brands/b1/cancel"));

    let (status, to, _) = post_form!(app, cookie, "/brands/b2/cancel?page=1", [("confirm", "")]);
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(to, "/brands");
    assert!(!get_page!(app, cookie, "/brands").contains("/cancel?page="));

    get_page!(app, cookie, "/brands?edit=b1");
    let (status, to, _) = post_form!(app, cookie, "/brands/b1?page=1", [("name", "Renamed")]);
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(to, "/brands");
    assert!(!get_page!(app, cookie, "/brands").contains("/cancel?page="));
}

#[actix_web::test]
async fn extreme_dashboard_year_is_clamped() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/admin/dashboard"))
        .and(query_param("year", "9999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "totalUsers": 1,
                "totalOrders": 2,
                "totalRevenue": 3.0,
                "revenueByTime": []
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = admin_app!(server);
    let mut cookie = sign_in!(app, "admin@example.com");

    let body = get_page!(app, cookie, "/?filterType=year&year=2147483647");
    assert!(body.contains("value=\"9999\""));
}
