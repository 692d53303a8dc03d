// storefront/src/pipelines/signin_pipeline.rs

use crate::db::UserRepo;
use crate::errors::AppError;
use crate::models::normalize_email;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::{auth_service, token_service};
use shopflow::{ContextData, Control, FlowResult, Flows, Pipeline};
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> AppError {
  AppError::Auth(INVALID_CREDENTIALS.to_string())
}

pub fn build_signin_pipeline() -> FlowResult<Pipeline<SigninCtxData, AppError>> {
  let mut p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false),
    ("fetch_user", false),
    ("verify_password", false),
    ("issue_token", false),
  ]);

  p.on("validate_signin_input", |ctx_data: ContextData<SigninCtxData>| async move {
    let mut guard = ctx_data.write();
    guard.email = normalize_email(&guard.email);
    if guard.email.is_empty() || guard.password.is_empty() {
      return Err(AppError::Validation("Email and password are required.".to_string()));
    }
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("fetch_user", |ctx_data: ContextData<SigninCtxData>| async move {
    let (email, db_pool) = {
      let guard = ctx_data.read();
      (guard.email.clone(), guard.app_state.db_pool.clone())
    };

    let Some(user) = UserRepo::find_by_email(&db_pool, &email).await? else {
      warn!("Signin attempt for unknown email.");
      return Err(invalid_credentials());
    };
    ctx_data.write().user = Some(user);
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("verify_password", |ctx_data: ContextData<SigninCtxData>| async move {
    let (stored_hash, candidate) = {
      let guard = ctx_data.read();
      let user = guard.user.as_ref().ok_or_else(invalid_credentials)?;
      (user.password_hash.clone(), guard.password.clone())
    };

    // Argon2 is CPU-heavy; keep it off the async workers.
    let matches = tokio::task::spawn_blocking(move || auth_service::verify_password(&stored_hash, &candidate))
      .await
      .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))??;
    if !matches {
      warn!("Signin attempt with wrong password.");
      return Err(invalid_credentials());
    }
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("issue_token", |ctx_data: ContextData<SigninCtxData>| async move {
    let mut guard = ctx_data.write();
    let user = guard.user.as_ref().ok_or_else(invalid_credentials)?;
    let token = token_service::issue_token(user.id, user.role, &guard.app_state.config)?;
    info!(user_id = %user.id, "User signed in.");
    guard.token = Some(token);
    Ok::<_, AppError>(Control::Continue)
  });

  Ok(p)
}

pub fn register_signin_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  flows.register(build_signin_pipeline()?);
  info!("Sign-in pipeline registered.");
  Ok(())
}
