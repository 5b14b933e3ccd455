use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::forms::{LoginForm, RegisterForm};
use crate::handlers::client::ApiClient;
use crate::session::RequestContext;

#[derive(Deserialize)]
struct LoginUser {
    #[serde(rename = "_id", alias = "id")]
    id: String,
}

#[derive(Deserialize, Default)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<LoginUser>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    data: Option<LoginData>,
}

/// `POST /auth/login`; the returned context is what the session stores.
pub async fn login(api: &ApiClient, form: &LoginForm) -> ApiResult<RequestContext> {
    let body = api
        .send_json(
            &RequestContext::anonymous(),
            Method::POST,
            "auth/login",
            &json!({ "email": form.email, "password": form.password }),
        )
        .await?;
    let response: LoginResponse = serde_json::from_value(body)?;
    let data = response.data.unwrap_or_default();
    let token = response
        .token
        .or(data.token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Malformed("login response carries no token".to_string()))?;
    log::info!("Signed in {}", form.email);
    Ok(RequestContext::new(token, data.user.map(|u| u.id)))
}

/// `POST /auth/signup`.
pub async fn signup(api: &ApiClient, form: &RegisterForm) -> ApiResult<()> {
    api.send_json(&RequestContext::anonymous(), Method::POST, "auth/signup", form)
        .await?;
    Ok(())
}
