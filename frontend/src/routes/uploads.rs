use std::collections::HashMap;

use actix_multipart::{Field, Multipart};
use actix_web::error::{ErrorBadRequest, ErrorInternalServerError, ErrorPayloadTooLarge};
use futures_util::{StreamExt, TryStreamExt};

use crate::handlers::products::Upload;

/// Name of the file input on the product forms.
pub const IMAGE_FIELD: &str = "images";

/// Largest product form accepted, all parts together.
pub const MAX_FORM_BYTES: usize = 20 * 1024 * 1024;

/// Reads one part, charging its bytes against `budget`.
async fn read_field(field: &mut Field, budget: &mut usize) -> Result<Vec<u8>, actix_web::Error> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk
            .map_err(|e| ErrorInternalServerError(format!("Error reading field chunk: {}", e)))?;
        *budget = budget
            .checked_sub(chunk.len())
            .ok_or_else(|| ErrorPayloadTooLarge("Upload is too large"))?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Splits a multipart body into text fields and image files. Images stay in
/// memory and are forwarded as received.
pub async fn read_multipart(
    payload: Multipart,
) -> Result<(HashMap<String, String>, Vec<Upload>), actix_web::Error> {
    read_multipart_within(payload, MAX_FORM_BYTES).await
}

/// [`read_multipart`] with an explicit byte limit.
pub async fn read_multipart_within(
    mut payload: Multipart,
    limit: usize,
) -> Result<(HashMap<String, String>, Vec<Upload>), actix_web::Error> {
    let mut budget = limit;
    let mut fields = HashMap::new();
    let mut uploads = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ErrorBadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let disposition = field
            .content_disposition()
            .cloned()
            .ok_or_else(|| ErrorBadRequest("Content disposition not found"))?;
        let name = disposition.get_name().unwrap_or("").to_string();
        let data = read_field(&mut field, &mut budget).await?;

        match disposition.get_filename() {
            Some(file_name) if name == IMAGE_FIELD => {
                // An untouched file input still posts one empty part.
                if file_name.is_empty() || data.is_empty() {
                    continue;
                }
                let content_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                uploads.push(Upload {
                    file_name: file_name.to_string(),
                    content_type,
                    bytes: data,
                });
            }
            _ => {
                fields.insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }

    log::debug!(
        "Multipart form with {} field(s) and {} image(s)",
        fields.len(),
        uploads.len()
    );
    Ok((fields, uploads))
}
