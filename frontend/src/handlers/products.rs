use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::error::{ApiError, ApiResult};
use crate::forms::ProductDraft;
use crate::handlers::client::ApiClient;
use crate::session::RequestContext;

/// An image received from the admin's browser, forwarded as-is.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn product_form(draft: &ProductDraft, images: &[Upload]) -> ApiResult<Form> {
    let mut form = Form::new();
    for (name, value) in draft.text_fields() {
        form = form.text(name, value);
    }
    for image in images {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| ApiError::Validation(format!("Invalid MIME type: {}", e)))?;
        form = form.part("images", part);
    }
    Ok(form)
}

/// `POST /products`: multipart when images are attached, JSON otherwise.
pub async fn create_product(
    api: &ApiClient,
    ctx: &RequestContext,
    draft: &ProductDraft,
    images: &[Upload],
) -> ApiResult<()> {
    if images.is_empty() {
        api.send_json(ctx, Method::POST, "products", draft).await?;
    } else {
        let form = product_form(draft, images)?;
        api.send_multipart(ctx, Method::POST, "products", form).await?;
    }
    log::info!("Created product {:?} with {} image(s)", draft.name_product, images.len());
    Ok(())
}

/// `PATCH /products/:id`, same body rules as [`create_product`].
pub async fn update_product(
    api: &ApiClient,
    ctx: &RequestContext,
    id: &str,
    draft: &ProductDraft,
    images: &[Upload],
) -> ApiResult<()> {
    let path = ApiClient::item_path("products", id);
    if images.is_empty() {
        api.send_json(ctx, Method::PATCH, &path, draft).await?;
    } else {
        let form = product_form(draft, images)?;
        api.send_multipart(ctx, Method::PATCH, &path, form).await?;
    }
    log::info!("Updated product {}", id);
    Ok(())
}
