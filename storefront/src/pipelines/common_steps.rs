// storefront/src/pipelines/common_steps.rs
use crate::db::UserRepo;
use crate::errors::AppError;
use crate::pipelines::contexts::{SendOrderConfirmationEmailCtxData, SendWelcomeEmailCtxData};
use crate::services::email_mock;
use crate::state::AppState;
use shopflow::{ContextData, Control, FlowError, FlowResult};
use tracing::{info, instrument};
use uuid::Uuid;

/// Formats an amount in minor units, e.g. `4599, "USD"` as `45.99 USD`.
pub fn format_money(cents: i64, currency: &str) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

#[instrument(name = "common_step::send_welcome_email", skip(ctx_data), err(Display))]
pub async fn send_welcome_email_step(ctx_data: ContextData<SendWelcomeEmailCtxData>) -> FlowResult<Control> {
  let (to, name, sender) = {
    let guard = ctx_data.read();
    (
      guard.recipient_email.clone(),
      guard.recipient_name.clone(),
      guard.app_state.config.mock_email_sender.clone(),
    )
  };

  let sent = email_mock::send_mock_email(
    &to,
    &sender,
    &format!("Welcome to the shop, {}!", name),
    &format!("<p>Hi {},</p><p>Thanks for creating an account.</p>", name),
  )
  .await
  .map_err(|e| FlowError::handler("send_welcome_email", e))?;

  info!(message_id = %sent.message_id, "Welcome email sent.");
  Ok(Control::Continue)
}

#[instrument(name = "common_step::send_order_confirmation", skip(ctx_data), err(Display))]
pub async fn send_order_confirmation_email_step(ctx_data: ContextData<SendOrderConfirmationEmailCtxData>) -> FlowResult<Control> {
  let (to, name, order_id, total, sender) = {
    let guard = ctx_data.read();
    (
      guard.recipient_email.clone(),
      guard.recipient_name.clone(),
      guard.order_id,
      guard.order_total_display.clone(),
      guard.app_state.config.mock_email_sender.clone(),
    )
  };

  let sent = email_mock::send_mock_email(
    &to,
    &sender,
    &format!("Your order #{} is confirmed", order_id),
    &format!(
      "<p>Hi {},</p><p>Your order #{} for {} has been confirmed.</p><p>Thank you for your purchase!</p>",
      name, order_id, total
    ),
  )
  .await
  .map_err(|e| FlowError::handler("send_order_confirmation", e))?;

  info!(message_id = %sent.message_id, %order_id, "Order confirmation sent.");
  Ok(Control::Continue)
}

/// Loads a user the pipeline knows must exist.
pub async fn require_user(app_state: &AppState, user_id: Uuid) -> Result<crate::models::User, AppError> {
  UserRepo::find_by_id(&app_state.db_pool, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

#[cfg(test)]
mod tests {
  use super::format_money;

  #[test]
  fn money_formatting() {
    assert_eq!(format_money(4599, "USD"), "45.99 USD");
    assert_eq!(format_money(5, "EUR"), "0.05 EUR");
    assert_eq!(format_money(-150, "USD"), "-1.50 USD");
  }
}
