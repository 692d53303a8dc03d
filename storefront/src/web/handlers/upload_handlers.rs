// storefront/src/web/handlers/upload_handlers.rs

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::uploads;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

fn too_large(limit: usize) -> AppError {
  AppError::PayloadTooLarge(format!("Upload exceeds the {} byte limit.", limit))
}

/// Buffers the body, failing as soon as it grows past `limit`.
async fn read_limited(req: &HttpRequest, mut payload: web::Payload, limit: usize) -> Result<web::BytesMut, AppError> {
  let declared = req
    .headers()
    .get(header::CONTENT_LENGTH)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.parse::<usize>().ok());
  if declared.is_some_and(|len| len > limit) {
    return Err(too_large(limit));
  }

  let mut body = web::BytesMut::new();
  while let Some(chunk) = payload.next().await {
    let chunk = chunk.map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
    if body.len() + chunk.len() > limit {
      return Err(too_large(limit));
    }
    body.extend_from_slice(&chunk);
  }
  Ok(body)
}

/// Stores the raw request body as an image.
#[instrument(name = "handler::upload_image", skip(app_state, _admin, req, payload), err(Display))]
pub async fn upload_image_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req: HttpRequest,
  payload: web::Payload,
) -> Result<HttpResponse, AppError> {
  let content_type = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::Validation("Content-Type header is required.".to_string()))?;

  let body = read_limited(&req, payload, app_state.config.max_upload_bytes).await?;
  let file_name = uploads::store_image(&app_state.config.upload_dir, content_type, &body).await?;
  let image_url = format!("{}/uploads/{}", app_state.config.app_base_url, file_name);
  info!(%image_url, size = body.len(), "Image uploaded.");
  Ok(HttpResponse::Ok().json(json!({ "imageUrl": image_url })))
}

#[instrument(name = "handler::serve_upload", skip(app_state), err(Display))]
pub async fn serve_upload_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let file_name = path.into_inner();
  let not_found = || AppError::NotFound("File not found.".to_string());
  let Some(content_type) = uploads::parse_stored_name(&file_name) else {
    warn!(%file_name, "Rejected upload path.");
    return Err(not_found());
  };

  let bytes = match tokio::fs::read(uploads::stored_path(&app_state.config.upload_dir, &file_name)).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
    Err(e) => return Err(e.into()),
  };
  Ok(
    HttpResponse::Ok()
      .content_type(content_type)
      .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
      .body(bytes),
  )
}
