// storefront/src/pipelines/checkout_pipeline.rs

use crate::db::{CartRepo, CheckoutRepo, ProductRepo};
use crate::errors::AppError;
use crate::models::{CartItem, CartOwner, NewCheckoutLine, Product};
use crate::pipelines::contexts::CreateCheckoutCtxData;
use shopflow::{ContextData, Control, FlowResult, Flows, Pipeline};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Prices cart lines against the current catalog. Returns the lines and the
/// single currency they share.
pub fn price_lines(cart_items: &[CartItem], products: &[Product]) -> Result<(Vec<NewCheckoutLine>, String), AppError> {
  let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();
  let mut wanted: HashMap<Uuid, i64> = HashMap::new();
  let mut currency: Option<&str> = None;
  let mut lines = Vec::with_capacity(cart_items.len());

  for item in cart_items {
    let product = by_id
      .get(&item.product_id)
      .filter(|p| p.is_published)
      .ok_or_else(|| AppError::Conflict(format!("'{}' is no longer available.", item.name)))?;

    match currency {
      None => currency = Some(product.currency.as_str()),
      Some(c) if c != product.currency => {
        return Err(AppError::Validation("All items in a checkout must share one currency.".to_string()));
      }
      Some(_) => {}
    }

    let total = wanted.entry(product.id).or_insert(0);
    *total += i64::from(item.quantity);
    if *total > i64::from(product.count_in_stock) {
      return Err(AppError::Validation(format!(
        "Insufficient stock for '{}': {} available.",
        product.name, product.count_in_stock
      )));
    }

    lines.push(NewCheckoutLine {
      product_id: product.id,
      name: product.name.clone(),
      image: product.primary_image_url(),
      price_cents: product.effective_price_cents(),
      size: item.size.clone(),
      color: item.color.clone(),
      quantity: item.quantity,
    });
  }

  let currency = currency.ok_or_else(|| AppError::Validation("Your cart is empty.".to_string()))?;
  Ok((lines, currency.to_string()))
}

pub fn build_create_checkout_pipeline() -> FlowResult<Pipeline<CreateCheckoutCtxData, AppError>> {
  let mut p = Pipeline::<CreateCheckoutCtxData, AppError>::new(&[
    ("validate_checkout_input", false),
    ("load_cart", false),
    ("price_lines", false),
    ("persist_checkout", false),
  ]);

  p.on("validate_checkout_input", |ctx_data: ContextData<CreateCheckoutCtxData>| async move {
    let mut guard = ctx_data.write();
    guard.shipping_address = guard.shipping_address.clone().validated()?;
    guard.payment_method = guard.payment_method.trim().to_string();
    if guard.payment_method.is_empty() {
      return Err(AppError::Validation("Payment method is required.".to_string()));
    }
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("load_cart", |ctx_data: ContextData<CreateCheckoutCtxData>| async move {
    let (user_id, db_pool) = {
      let guard = ctx_data.read();
      (guard.user_id, guard.app_state.db_pool.clone())
    };
    let cart = CartRepo::find_by_owner(&db_pool, &CartOwner::User(user_id)).await?;
    let items = match cart {
      Some(cart) => CartRepo::items(&db_pool, cart.id).await?,
      None => Vec::new(),
    };
    if items.is_empty() {
      warn!(%user_id, "Checkout attempted with an empty cart.");
      return Err(AppError::Validation("Your cart is empty.".to_string()));
    }
    ctx_data.write().cart_items = items;
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("price_lines", |ctx_data: ContextData<CreateCheckoutCtxData>| async move {
    let (items, db_pool) = {
      let guard = ctx_data.read();
      (guard.cart_items.clone(), guard.app_state.db_pool.clone())
    };
    let mut ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let products = ProductRepo::find_many(&db_pool, &ids).await?;
    let (lines, currency) = price_lines(&items, &products)?;

    let mut guard = ctx_data.write();
    guard.lines = lines;
    guard.currency = Some(currency);
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("persist_checkout", persist_checkout);

  Ok(p)
}

#[instrument(name = "checkout_step::persist", skip(ctx_data), err(Display))]
async fn persist_checkout(ctx_data: ContextData<CreateCheckoutCtxData>) -> Result<Control, AppError> {
  let (user_id, address, method, currency, lines, db_pool) = {
    let guard = ctx_data.read();
    let currency = guard
      .currency
      .clone()
      .ok_or_else(|| AppError::Internal("Checkout persisted before pricing.".to_string()))?;
    (
      guard.user_id,
      guard.shipping_address.clone(),
      guard.payment_method.clone(),
      currency,
      guard.lines.clone(),
      guard.app_state.db_pool.clone(),
    )
  };

  let mut tx = db_pool.begin().await?;
  let view = CheckoutRepo::create(&mut tx, user_id, &address, &method, &currency, &lines).await?;
  tx.commit().await?;

  info!(checkout_id = %view.checkout.id, total_cents = view.checkout.total_price_cents, "Checkout created.");
  ctx_data.write().checkout = Some(view);
  Ok(Control::Continue)
}

pub fn register_create_checkout_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  flows.register(build_create_checkout_pipeline()?);
  info!("Create-checkout pipeline registered.");
  Ok(())
}
