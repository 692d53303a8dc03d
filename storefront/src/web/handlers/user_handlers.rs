// storefront/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopflow::ContextData;
use tracing::{info, instrument};

use super::run_to_completion;
use crate::db::UserRepo;
use crate::errors::AppError;
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
  pub name: String,
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub email: String,
  pub password: String,
}

#[instrument(name = "handler::register", skip(app_state, payload), err(Display))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(SignupCtxData::new(
    app_state.get_ref().clone(),
    payload.name,
    payload.email,
    payload.password,
  ));
  run_to_completion(&app_state, ctx.clone()).await?;

  let guard = ctx.read();
  let user = guard
    .created_user
    .as_ref()
    .ok_or_else(|| AppError::Internal("Signup completed without creating a user.".to_string()))?;
  let token = guard
    .token
    .as_ref()
    .ok_or_else(|| AppError::Internal("Signup completed without a session token.".to_string()))?;

  info!(user_id = %user.id, welcome_email_sent = guard.welcome_email_sent, "User registered.");
  Ok(HttpResponse::Created().json(json!({ "user": user, "token": token })))
}

#[instrument(name = "handler::login", skip(app_state, payload), err(Display))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    user: None,
    token: None,
  });
  run_to_completion(&app_state, ctx.clone()).await?;

  let guard = ctx.read();
  let (Some(user), Some(token)) = (guard.user.as_ref(), guard.token.as_ref()) else {
    return Err(AppError::Internal("Sign-in completed without a session.".to_string()));
  };
  info!(user_id = %user.id, "User signed in.");
  Ok(HttpResponse::Ok().json(json!({ "user": user, "token": token })))
}

#[instrument(name = "handler::profile", skip(app_state), fields(user_id = %auth.user_id), err(Display))]
pub async fn profile_handler(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let user = UserRepo::find_by_id(&app_state.db_pool, auth.user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
  Ok(HttpResponse::Ok().json(user))
}
