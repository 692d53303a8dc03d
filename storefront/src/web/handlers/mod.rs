// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod subscribe_handlers;
pub mod upload_handlers;
pub mod user_handlers;

use crate::errors::AppError;
use crate::state::AppState;
use shopflow::ContextData;
use tracing::warn;

/// Runs the pipeline registered for `T`. Every storefront flow is expected to
/// complete; a halted run is reported as an internal error.
pub(crate) async fn run_to_completion<T: Send + Sync + 'static>(
  app_state: &AppState,
  ctx: ContextData<T>,
) -> Result<(), AppError> {
  if app_state.flows.run(ctx).await?.is_completed() {
    return Ok(());
  }
  warn!(flow = std::any::type_name::<T>(), "Pipeline halted before completing.");
  Err(AppError::Internal("Request processing was halted by an internal step.".to_string()))
}
