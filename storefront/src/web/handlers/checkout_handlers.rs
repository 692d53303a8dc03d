// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shopflow::ContextData;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::run_to_completion;
use crate::db::CheckoutRepo;
use crate::errors::AppError;
use crate::models::{CheckoutView, PaymentStatus, ShippingAddress};
use crate::pipelines::contexts::{CreateCheckoutCtxData, FinalizeCheckoutCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutPayload {
  pub shipping_address: ShippingAddress,
  pub payment_method: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PayCheckoutPayload {
  pub payment_status: PaymentStatus,
  pub payment_details: Option<serde_json::Value>,
}

#[instrument(name = "handler::create_checkout", skip(app_state, auth, payload), fields(user_id = %auth.user_id), err(Display))]
pub async fn create_checkout_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<CreateCheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(CreateCheckoutCtxData {
    app_state: app_state.get_ref().clone(),
    user_id: auth.user_id,
    shipping_address: payload.shipping_address,
    payment_method: payload.payment_method,
    cart_items: Vec::new(),
    lines: Vec::new(),
    currency: None,
    checkout: None,
  });
  run_to_completion(&app_state, ctx.clone()).await?;

  let checkout = ctx
    .write()
    .checkout
    .take()
    .ok_or_else(|| AppError::Internal("Checkout pipeline completed without a checkout.".to_string()))?;
  Ok(HttpResponse::Created().json(checkout))
}

#[instrument(name = "handler::pay_checkout", skip(app_state, auth, payload), fields(user_id = %auth.user_id), err(Display))]
pub async fn pay_checkout_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<PayCheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let checkout_id = path.into_inner();
  if payload.payment_status != PaymentStatus::Paid {
    warn!(status = ?payload.payment_status, "Unsupported payment status update.");
    return Err(AppError::Validation("Invalid payment status.".to_string()));
  }
  let db_pool = &app_state.db_pool;

  let Some(checkout) = CheckoutRepo::mark_paid(db_pool, checkout_id, auth.user_id, payload.payment_details.as_ref()).await?
  else {
    // Distinguish a foreign or missing checkout from one that is already closed.
    return match CheckoutRepo::find_for_user(db_pool, checkout_id, auth.user_id).await? {
      Some(_) => Err(AppError::Conflict("Checkout already finalized.".to_string())),
      None => Err(AppError::NotFound("Checkout not found.".to_string())),
    };
  };
  let checkout_items = CheckoutRepo::items(db_pool, checkout_id).await?;

  info!(%checkout_id, "Checkout marked as paid.");
  Ok(HttpResponse::Ok().json(CheckoutView {
    checkout,
    checkout_items,
  }))
}

#[instrument(name = "handler::finalize_checkout", skip(app_state, auth), fields(user_id = %auth.user_id), err(Display))]
pub async fn finalize_checkout_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(FinalizeCheckoutCtxData::new(
    app_state.get_ref().clone(),
    auth.user_id,
    path.into_inner(),
  ));
  run_to_completion(&app_state, ctx.clone()).await?;

  let mut guard = ctx.write();
  let order = guard
    .order
    .take()
    .ok_or_else(|| AppError::Internal("Finalize completed without an order.".to_string()))?;
  info!(order_id = %order.order.id, confirmation_email_sent = guard.confirmation_email_sent, "Checkout finalized.");
  Ok(HttpResponse::Created().json(order))
}
