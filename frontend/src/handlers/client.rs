use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::session::RequestContext;

/// Thin wrapper over `reqwest::Client` bound to one backend base URL.
///
/// The bearer token comes from the [`RequestContext`] passed to each call.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `collection/id` with the id percent-encoded.
    pub fn item_path(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, urlencoding::encode(id))
    }

    fn request(&self, ctx: &RequestContext, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        match ctx.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<Q: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &Q,
    ) -> ApiResult<Value> {
        execute(self.request(ctx, Method::GET, path).query(query)).await
    }

    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<Value> {
        execute(self.request(ctx, method, path).json(body)).await
    }

    /// reqwest writes the `multipart/form-data; boundary=...` header itself.
    pub async fn send_multipart(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        form: Form,
    ) -> ApiResult<Value> {
        execute(self.request(ctx, method, path).multipart(form)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> ApiResult<Value> {
        execute(self.request(ctx, Method::DELETE, path)).await
    }
}

async fn execute(request: RequestBuilder) -> ApiResult<Value> {
    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let url = response.url().clone();
            let body = response.text().await.map_err(ApiError::from)?;

            if !status.is_success() {
                log::warn!("{} answered {}: {}", url, status, body);
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: body,
                });
            }

            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body).map_err(|e| {
                log::warn!("{} sent a body that is not JSON: {}", url, e);
                ApiError::Malformed(format!("Failed to parse JSON: {}", e))
            })
        }
        Err(e) => {
            log::warn!("Request error: {}", e);
            Err(ApiError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let api = ApiClient::new("http://localhost:3000/api/v1/");
        assert_eq!(api.base_url(), "http://localhost:3000/api/v1");
        assert_eq!(api.url("/products"), "http://localhost:3000/api/v1/products");
        assert_eq!(api.url("brands"), "http://localhost:3000/api/v1/brands");
    }

    #[test]
    fn item_ids_are_percent_encoded() {
        assert_eq!(ApiClient::item_path("admin/users", "a b/c"), "admin/users/a%20b%2Fc");
    }
}
