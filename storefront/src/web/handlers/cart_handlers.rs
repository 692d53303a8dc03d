// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shopflow::ContextData;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::run_to_completion;
use crate::db::{CartRepo, ProductRepo};
use crate::errors::AppError;
use crate::models::{CartOwner, CartView};
use crate::pipelines::cart_pipeline::ensure_within_stock;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, OptionalUser};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  pub quantity: i32,
  #[serde(default)]
  pub size: String,
  #[serde(default)]
  pub color: String,
  pub guest_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartPayload {
  pub product_id: Uuid,
  pub quantity: i32,
  #[serde(default)]
  pub size: String,
  #[serde(default)]
  pub color: String,
  pub guest_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartPayload {
  pub product_id: Uuid,
  #[serde(default)]
  pub size: String,
  #[serde(default)]
  pub color: String,
  pub guest_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GuestQuery {
  pub guest_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartPayload {
  pub guest_id: String,
}

/// The authenticated user owns the cart; otherwise the guest id does.
pub fn resolve_owner(user: &OptionalUser, guest_id: Option<&str>) -> Result<CartOwner, AppError> {
  if let Some(user) = user.0 {
    return Ok(CartOwner::User(user.user_id));
  }
  match guest_id.map(str::trim).filter(|g| !g.is_empty()) {
    Some(guest) => Ok(CartOwner::Guest(guest.to_string())),
    None => Err(AppError::Validation("A logged-in user or a guestId is required.".to_string())),
  }
}

async fn load_view(app_state: &AppState, owner: &CartOwner) -> Result<CartView, AppError> {
  let mut conn = app_state.db_pool.acquire().await?;
  CartRepo::view(&mut conn, owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))
}

#[instrument(name = "handler::add_to_cart", skip(app_state, user, payload), fields(product_id = %payload.product_id), err(Display))]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  user: OptionalUser,
  payload: web::Json<AddToCartPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let owner = resolve_owner(&user, payload.guest_id.as_deref())?;

  let ctx = ContextData::new(AddToCartCtxData {
    app_state: app_state.get_ref().clone(),
    owner,
    product_id: payload.product_id,
    quantity: payload.quantity,
    size: payload.size,
    color: payload.color,
    product: None,
    cart: None,
  });
  run_to_completion(&app_state, ctx.clone()).await?;

  let cart = ctx
    .write()
    .cart
    .take()
    .ok_or_else(|| AppError::Internal("Add to cart completed without a cart.".to_string()))?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(name = "handler::update_cart", skip(app_state, user, payload), fields(product_id = %payload.product_id), err(Display))]
pub async fn update_cart_handler(
  app_state: web::Data<AppState>,
  user: OptionalUser,
  payload: web::Json<UpdateCartPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  if payload.quantity < 0 {
    return Err(AppError::Validation("Quantity cannot be negative.".to_string()));
  }
  let owner = resolve_owner(&user, payload.guest_id.as_deref())?;
  let (size, color) = (payload.size.trim(), payload.color.trim());
  let db_pool = &app_state.db_pool;

  let cart = CartRepo::find_by_owner(db_pool, &owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
  let line_missing = || AppError::NotFound("Product not found in cart.".to_string());

  if payload.quantity == 0 {
    if !CartRepo::remove_item(db_pool, cart.id, payload.product_id, size, color).await? {
      return Err(line_missing());
    }
  } else {
    let items = CartRepo::items(db_pool, cart.id).await?;
    let line = items
      .iter()
      .find(|i| i.product_id == payload.product_id && i.size == size && i.color == color)
      .ok_or_else(line_missing)?;
    let other_lines: i64 = items
      .iter()
      .filter(|i| i.product_id == payload.product_id && i.id != line.id)
      .map(|i| i64::from(i.quantity))
      .sum();
    let product = ProductRepo::find_by_id(db_pool, payload.product_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
    ensure_within_stock(payload.quantity, other_lines, product.count_in_stock)?;
    CartRepo::set_quantity(db_pool, cart.id, payload.product_id, size, color, payload.quantity)
      .await?
      .ok_or_else(line_missing)?;
  }
  CartRepo::touch(db_pool, cart.id).await?;

  Ok(HttpResponse::Ok().json(load_view(&app_state, &owner).await?))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, user, payload), fields(product_id = %payload.product_id), err(Display))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  user: OptionalUser,
  payload: web::Json<RemoveFromCartPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let owner = resolve_owner(&user, payload.guest_id.as_deref())?;
  let db_pool = &app_state.db_pool;

  let cart = CartRepo::find_by_owner(db_pool, &owner)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
  if !CartRepo::remove_item(db_pool, cart.id, payload.product_id, payload.size.trim(), payload.color.trim()).await? {
    return Err(AppError::NotFound("Product not found in cart.".to_string()));
  }
  CartRepo::touch(db_pool, cart.id).await?;

  Ok(HttpResponse::Ok().json(load_view(&app_state, &owner).await?))
}

#[instrument(name = "handler::get_cart", skip(app_state, user, query), err(Display))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  user: OptionalUser,
  query: web::Query<GuestQuery>,
) -> Result<HttpResponse, AppError> {
  let owner = resolve_owner(&user, query.guest_id.as_deref())?;
  Ok(HttpResponse::Ok().json(load_view(&app_state, &owner).await?))
}

#[instrument(name = "handler::merge_cart", skip(app_state, auth, payload), fields(user_id = %auth.user_id), err(Display))]
pub async fn merge_cart_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<MergeCartPayload>,
) -> Result<HttpResponse, AppError> {
  let guest_id = payload.guest_id.trim();
  if guest_id.is_empty() {
    return Err(AppError::Validation("guestId is required.".to_string()));
  }
  let owner = CartOwner::User(auth.user_id);

  let mut tx = app_state.db_pool.begin().await?;
  let Some(merged) = CartRepo::merge_guest_into_user(&mut tx, guest_id, auth.user_id).await? else {
    warn!("Merge requested for a missing guest cart.");
    return Err(AppError::NotFound("Guest cart not found.".to_string()));
  };
  let view = CartRepo::view(&mut tx, &owner)
    .await?
    .ok_or_else(|| AppError::Internal("Merged cart is not readable.".to_string()))?;
  tx.commit().await?;

  info!(cart_id = %merged.id, "Guest cart merged.");
  Ok(HttpResponse::Ok().json(view))
}
