// storefront/src/pipelines/finalize_pipeline.rs

use crate::db::{CartRepo, CheckoutRepo, OrderRepo, ProductRepo};
use crate::errors::AppError;
use crate::models::{Checkout, CheckoutView};
use crate::pipelines::common_steps::{self, format_money};
use crate::pipelines::contexts::{FinalizeCheckoutCtxData, SendOrderConfirmationEmailCtxData};
use shopflow::{ContextData, Control, FlowResult, Flows, Pipeline};
use tracing::{info, instrument, warn};

/// A checkout turns into an order once: it must be paid and not yet finalized.
pub fn ensure_finalizable(checkout: &Checkout) -> Result<(), AppError> {
  if checkout.is_finalized {
    return Err(AppError::Conflict("Checkout already finalized.".to_string()));
  }
  if !checkout.is_paid {
    return Err(AppError::Validation("Checkout is not paid.".to_string()));
  }
  Ok(())
}

pub fn build_finalize_checkout_pipeline() -> FlowResult<Pipeline<FinalizeCheckoutCtxData, AppError>> {
  let mut p = Pipeline::<FinalizeCheckoutCtxData, AppError>::new(&[
    ("load_checkout", false),
    ("check_finalizable", false),
    ("commit_order", false),
    ("send_order_confirmation", true),
  ]);

  p.on("load_checkout", |ctx_data: ContextData<FinalizeCheckoutCtxData>| async move {
    let (checkout_id, user_id, app_state) = {
      let guard = ctx_data.read();
      (guard.checkout_id, guard.user_id, guard.app_state.clone())
    };
    let checkout = CheckoutRepo::find_for_user(&app_state.db_pool, checkout_id, user_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Checkout not found.".to_string()))?;
    let checkout_items = CheckoutRepo::items(&app_state.db_pool, checkout_id).await?;
    let customer = common_steps::require_user(&app_state, user_id).await?;

    let mut guard = ctx_data.write();
    guard.checkout = Some(CheckoutView {
      checkout,
      checkout_items,
    });
    guard.customer = Some(customer);
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("check_finalizable", |ctx_data: ContextData<FinalizeCheckoutCtxData>| async move {
    let guard = ctx_data.read();
    let view = guard
      .checkout
      .as_ref()
      .ok_or_else(|| AppError::Internal("Finalize check ran without a checkout.".to_string()))?;
    ensure_finalizable(&view.checkout)?;
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("commit_order", commit_order);

  p.on("send_order_confirmation", |ctx_data: ContextData<FinalizeCheckoutCtxData>| async move {
    let email_ctx = {
      let guard = ctx_data.read();
      let (Some(order), Some(customer)) = (guard.order.as_ref(), guard.customer.as_ref()) else {
        return Err(AppError::Internal("No order or customer to confirm.".to_string()));
      };
      SendOrderConfirmationEmailCtxData {
        app_state: guard.app_state.clone(),
        recipient_email: customer.email.clone(),
        recipient_name: customer.name.clone(),
        order_id: order.order.id,
        order_total_display: format_money(order.order.total_price_cents, &order.order.currency),
      }
    };
    common_steps::send_order_confirmation_email_step(ContextData::new(email_ctx)).await?;
    ctx_data.write().confirmation_email_sent = true;
    Ok::<_, AppError>(Control::Continue)
  });

  Ok(p)
}

/// Claims the checkout, writes the order, takes the stock and clears the
/// cart. Any failure rolls all of it back.
#[instrument(name = "finalize_step::commit_order", skip(ctx_data), err(Display))]
async fn commit_order(ctx_data: ContextData<FinalizeCheckoutCtxData>) -> Result<Control, AppError> {
  let (view, db_pool) = {
    let guard = ctx_data.read();
    let view = guard
      .checkout
      .clone()
      .ok_or_else(|| AppError::Internal("Order commit ran without a checkout.".to_string()))?;
    (view, guard.app_state.db_pool.clone())
  };

  let mut tx = db_pool.begin().await?;
  if !CheckoutRepo::claim_for_finalize(&mut *tx, view.checkout.id).await? {
    warn!(checkout_id = %view.checkout.id, "Checkout was finalized concurrently.");
    return Err(AppError::Conflict("Checkout already finalized.".to_string()));
  }

  let order = OrderRepo::create_from_checkout(&mut tx, &view).await?;

  for item in &view.checkout_items {
    let Some(product_id) = item.product_id else {
      return Err(AppError::Conflict(format!("'{}' is no longer available.", item.name)));
    };
    if !ProductRepo::decrement_stock(&mut *tx, product_id, item.quantity).await? {
      warn!(%product_id, quantity = item.quantity, "Stock shortfall at finalize.");
      return Err(AppError::Conflict(format!("Insufficient stock for '{}'.", item.name)));
    }
  }

  CartRepo::delete_for_user(&mut *tx, view.checkout.user_id).await?;
  tx.commit().await?;

  info!(order_id = %order.order.id, checkout_id = %view.checkout.id, "Order created from checkout.");
  ctx_data.write().order = Some(order);
  Ok(Control::Continue)
}

pub fn register_finalize_checkout_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  flows.register(build_finalize_checkout_pipeline()?);
  info!("Finalize-checkout pipeline registered.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::user::tests::sample_user;
  use crate::models::{Order, OrderStatus, OrderView, PaymentStatus, ShippingAddress, UserRole};
  use crate::state::tests::lazy_state;
  use chrono::Utc;
  use shopflow::RunOutcome;
  use sqlx::types::Json;
  use uuid::Uuid;

  fn checkout(is_paid: bool, is_finalized: bool) -> Checkout {
    Checkout {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      shipping_address: Json(ShippingAddress {
        address: "1 Main St".into(),
        city: "Springfield".into(),
        postal_code: "12345".into(),
        country: "US".into(),
      }),
      payment_method: "card".into(),
      total_price_cents: 5000,
      currency: "USD".into(),
      payment_status: if is_paid { PaymentStatus::Paid } else { PaymentStatus::Pending },
      payment_details: None,
      is_paid,
      paid_at: is_paid.then(Utc::now),
      is_finalized,
      finalized_at: None,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn only_paid_open_checkouts_finalize() {
    assert!(ensure_finalizable(&checkout(true, false)).is_ok());
    assert!(matches!(ensure_finalizable(&checkout(false, false)), Err(AppError::Validation(_))));
    assert!(matches!(ensure_finalizable(&checkout(true, true)), Err(AppError::Conflict(_))));
  }

  fn order_for(checkout: &Checkout) -> OrderView {
    OrderView {
      order: Order {
        id: Uuid::new_v4(),
        user_id: checkout.user_id,
        checkout_id: Some(checkout.id),
        shipping_address: checkout.shipping_address.clone(),
        payment_method: checkout.payment_method.clone(),
        total_price_cents: 5000,
        currency: "USD".into(),
        is_paid: true,
        paid_at: checkout.paid_at,
        payment_status: PaymentStatus::Paid,
        is_delivered: false,
        delivered_at: None,
        status: OrderStatus::Processing,
        created_at: Utc::now(),
        updated_at: Utc::now(),
      },
      order_items: Vec::new(),
    }
  }

  /// Only the confirmation step, with the order already committed.
  async fn confirm_offline(email: &str) -> (RunOutcome, ContextData<FinalizeCheckoutCtxData>) {
    let mut p = build_finalize_checkout_pipeline().unwrap();
    for step in ["load_checkout", "check_finalizable", "commit_order"] {
      p.remove_step(step).unwrap();
    }

    let paid = checkout(true, true);
    let mut data = FinalizeCheckoutCtxData::new(lazy_state(), paid.user_id, paid.id);
    data.customer = Some(sample_user(email, UserRole::Customer));
    data.order = Some(order_for(&paid));
    let ctx = ContextData::new(data);
    (p.run(ctx.clone()).await.unwrap(), ctx)
  }

  #[tokio::test]
  async fn failed_confirmation_email_keeps_the_order() {
    let (outcome, ctx) = confirm_offline("buyer@example.invalid").await;
    assert_eq!(outcome, RunOutcome::Completed);
    let data = ctx.read();
    assert!(data.order.is_some());
    assert!(!data.confirmation_email_sent);
  }

  #[tokio::test]
  async fn delivered_confirmation_email_is_recorded() {
    let (outcome, ctx) = confirm_offline("buyer@example.com").await;
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(ctx.read().confirmation_email_sent);
  }
}
