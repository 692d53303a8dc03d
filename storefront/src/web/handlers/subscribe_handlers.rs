// storefront/src/web/handlers/subscribe_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::db::SubscriberRepo;
use crate::errors::AppError;
use crate::models::{is_plausible_email, normalize_email};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct SubscribePayload {
  pub email: String,
}

#[instrument(name = "handler::subscribe", skip(app_state, payload), err(Display))]
pub async fn subscribe_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SubscribePayload>,
) -> Result<HttpResponse, AppError> {
  let email = normalize_email(&payload.email);
  if !is_plausible_email(&email) {
    return Err(AppError::Validation("Valid email is required.".to_string()));
  }
  let subscriber = SubscriberRepo::create(&app_state.db_pool, &email)
    .await?
    .ok_or_else(|| AppError::Validation("Email is already subscribed.".to_string()))?;

  info!(subscriber_id = %subscriber.id, "Newsletter subscription added.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Successfully subscribed to the newsletter!",
    "subscriber": subscriber,
  })))
}
