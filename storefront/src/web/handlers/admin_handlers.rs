// storefront/src/web/handlers/admin_handlers.rs

//! Back-office routes. Every handler takes an `AdminUser`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopflow::ContextData;
use tracing::{info, instrument};
use uuid::Uuid;

use super::run_to_completion;
use crate::db::{OrderRepo, ProductRepo, UserRepo};
use crate::errors::AppError;
use crate::models::{is_plausible_email, normalize_email, OrderStatus, UserRole};
use crate::pipelines::contexts::SignupCtxData;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct CreateUserPayload {
  pub name: String,
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub role: UserRole,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateUserPayload {
  pub name: Option<String>,
  pub email: Option<String>,
  pub role: Option<UserRole>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateOrderPayload {
  pub status: OrderStatus,
}

#[instrument(name = "handler::admin_list_users", skip(app_state, _admin), err(Display))]
pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(UserRepo::list(&app_state.db_pool).await?))
}

/// Creates an account through the sign-up flow without opening a session for it.
#[instrument(name = "handler::admin_create_user", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id), err(Display))]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<CreateUserPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let mut signup = SignupCtxData::new(app_state.get_ref().clone(), payload.name, payload.email, payload.password);
  signup.role = payload.role;
  signup.issue_session = false;

  let ctx = ContextData::new(signup);
  run_to_completion(&app_state, ctx.clone()).await?;

  let user = ctx
    .write()
    .created_user
    .take()
    .ok_or_else(|| AppError::Internal("User creation completed without a user.".to_string()))?;
  info!(user_id = %user.id, role = user.role.as_str(), "User created by admin.");
  Ok(HttpResponse::Created().json(json!({ "message": "User created successfully.", "user": user })))
}

#[instrument(name = "handler::admin_update_user", skip(app_state, _admin, payload), err(Display))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateUserPayload>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let payload = payload.into_inner();

  let name = payload.name.map(|n| n.trim().to_string());
  if name.as_deref() == Some("") {
    return Err(AppError::Validation("Name cannot be empty.".to_string()));
  }
  let email = payload.email.map(|e| normalize_email(&e));
  if let Some(email) = email.as_deref() {
    if !is_plausible_email(email) {
      return Err(AppError::Validation("Valid email is required.".to_string()));
    }
  }

  let user = UserRepo::update(&app_state.db_pool, id, name.as_deref(), email.as_deref(), payload.role)
    .await
    .map_err(|e| AppError::from(e).classify())?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
  info!(user_id = %id, "User updated by admin.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully.", "user": user })))
}

#[instrument(name = "handler::admin_delete_user", skip(app_state, _admin), err(Display))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if !UserRepo::delete(&app_state.db_pool, id).await? {
    return Err(AppError::NotFound("User not found.".to_string()));
  }
  info!(user_id = %id, "User deleted by admin.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully." })))
}

#[instrument(name = "handler::admin_list_products", skip(app_state, _admin), err(Display))]
pub async fn list_products_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(ProductRepo::list_all(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin_list_orders", skip(app_state, _admin), err(Display))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(OrderRepo::list_all(&app_state.db_pool).await?))
}

#[instrument(name = "handler::admin_update_order", skip(app_state, _admin), err(Display))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateOrderPayload>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let order = OrderRepo::update_status(&app_state.db_pool, id, payload.status)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
  info!(order_id = %id, status = ?order.status, "Order status updated.");
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::admin_delete_order", skip(app_state, _admin), err(Display))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if !OrderRepo::delete(&app_state.db_pool, id).await? {
    return Err(AppError::NotFound("Order not found.".to_string()));
  }
  info!(order_id = %id, "Order deleted by admin.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Order removed." })))
}
