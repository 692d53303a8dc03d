// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::db::OrderRepo;
use crate::errors::AppError;
use crate::models::OrderView;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::my_orders", skip(app_state, auth), fields(user_id = %auth.user_id), err(Display))]
pub async fn my_orders_handler(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(OrderRepo::list_for_user(&app_state.db_pool, auth.user_id).await?))
}

/// Owners and admins see the order; anyone else gets a 404.
#[instrument(name = "handler::get_order", skip(app_state, auth), fields(user_id = %auth.user_id), err(Display))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = OrderRepo::find_by_id(&app_state.db_pool, path.into_inner())
    .await?
    .filter(|o| o.user_id == auth.user_id || auth.is_admin())
    .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
  let order_items = OrderRepo::items(&app_state.db_pool, order.id).await?;
  Ok(HttpResponse::Ok().json(OrderView { order, order_items }))
}
