// storefront/src/pipelines/cart_pipeline.rs

use crate::db::{CartRepo, ProductRepo};
use crate::errors::AppError;
use crate::models::Product;
use crate::pipelines::contexts::AddToCartCtxData;
use shopflow::{ContextData, Control, FlowResult, Flows, Pipeline};
use tracing::{info, warn};

/// Checks a requested size/color against the product's axes. An axis the
/// product does not define is stored as the empty string.
pub fn resolve_variant(product: &Product, size: &str, color: &str) -> Result<(String, String), AppError> {
  fn pick(axis: &[String], requested: &str, label: &str) -> Result<String, AppError> {
    if axis.is_empty() {
      return Ok(String::new());
    }
    let requested = requested.trim();
    if requested.is_empty() {
      return Err(AppError::Validation(format!("Please choose a {}.", label)));
    }
    axis
      .iter()
      .find(|v| v.as_str() == requested)
      .cloned()
      .ok_or_else(|| AppError::Validation(format!("{} '{}' is not available for this product.", label, requested)))
  }
  Ok((pick(&product.sizes, size, "size")?, pick(&product.colors, color, "color")?))
}

/// The cart may never hold more units of a product than are in stock.
pub fn ensure_within_stock(requested: i32, already_in_cart: i64, count_in_stock: i32) -> Result<(), AppError> {
  if i64::from(requested) + already_in_cart > i64::from(count_in_stock) {
    let available = (i64::from(count_in_stock) - already_in_cart).max(0);
    return Err(AppError::Validation(format!(
      "Insufficient stock: only {} more available.",
      available
    )));
  }
  Ok(())
}

pub fn build_add_to_cart_pipeline() -> FlowResult<Pipeline<AddToCartCtxData, AppError>> {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_input", false),
    ("fetch_product", false),
    ("check_variant", false),
    ("check_stock", false),
    ("add_line", false),
  ]);

  p.on("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let quantity = ctx_data.read().quantity;
    if quantity <= 0 {
      warn!(quantity, "Invalid cart quantity.");
      return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
    }
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("fetch_product", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (product_id, db_pool) = {
      let guard = ctx_data.read();
      (guard.product_id, guard.app_state.db_pool.clone())
    };
    let product = ProductRepo::find_by_id(&db_pool, product_id)
      .await?
      .filter(|p| p.is_published)
      .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
    ctx_data.write().product = Some(product);
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("check_variant", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let mut guard = ctx_data.write();
    let product = guard
      .product
      .as_ref()
      .ok_or_else(|| AppError::Internal("Variant check ran without a product.".to_string()))?;
    let (size, color) = resolve_variant(product, &guard.size, &guard.color)?;
    guard.size = size;
    guard.color = color;
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("check_stock", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (owner, product_id, quantity, stock, db_pool) = {
      let guard = ctx_data.read();
      let stock = guard.product.as_ref().map(|p| p.count_in_stock).unwrap_or_default();
      (guard.owner.clone(), guard.product_id, guard.quantity, stock, guard.app_state.db_pool.clone())
    };
    let already = match CartRepo::find_by_owner(&db_pool, &owner).await? {
      Some(cart) => CartRepo::quantity_of_product(&db_pool, cart.id, product_id).await?,
      None => 0,
    };
    ensure_within_stock(quantity, already, stock)?;
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("add_line", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (owner, product, size, color, quantity, db_pool) = {
      let guard = ctx_data.read();
      let product = guard
        .product
        .clone()
        .ok_or_else(|| AppError::Internal("Cart line add ran without a product.".to_string()))?;
      (
        guard.owner.clone(),
        product,
        guard.size.clone(),
        guard.color.clone(),
        guard.quantity,
        guard.app_state.db_pool.clone(),
      )
    };

    let mut tx = db_pool.begin().await?;
    let cart = CartRepo::find_or_create(&mut tx, &owner).await?;
    let line = CartRepo::add_item(&mut *tx, cart.id, &product, &size, &color, quantity).await?;
    CartRepo::touch(&mut *tx, cart.id).await?;
    let view = CartRepo::view(&mut tx, &owner)
      .await?
      .ok_or_else(|| AppError::Internal("Cart vanished while adding a line.".to_string()))?;
    tx.commit().await?;

    info!(%owner, cart_id = %cart.id, line_quantity = line.quantity, "Cart line added.");
    ctx_data.write().cart = Some(view);
    Ok::<_, AppError>(Control::Continue)
  });

  Ok(p)
}

pub fn register_add_to_cart_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  flows.register(build_add_to_cart_pipeline()?);
  info!("Add-to-cart pipeline registered.");
  Ok(())
}
