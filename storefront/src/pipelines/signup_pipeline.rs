// storefront/src/pipelines/signup_pipeline.rs

use crate::db::UserRepo;
use crate::errors::AppError;
use crate::models::{is_plausible_email, normalize_email};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{SendWelcomeEmailCtxData, SignupCtxData};
use crate::services::{auth_service, token_service};
use shopflow::{ContextData, Control, FlowResult, Flows, Pipeline};
use tracing::{debug, info, warn};

pub fn build_signup_pipeline() -> FlowResult<Pipeline<SignupCtxData, AppError>> {
  let mut p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false),
    ("check_existing_user", false),
    ("create_user", false),
    ("send_welcome_email", true),
    ("issue_token", false),
  ]);

  p.on("validate_signup_input", |ctx_data: ContextData<SignupCtxData>| async move {
    let mut guard = ctx_data.write();
    guard.name = guard.name.trim().to_string();
    guard.email = normalize_email(&guard.email);

    if guard.name.is_empty() {
      return Err(AppError::Validation("Name is required.".to_string()));
    }
    if !is_plausible_email(&guard.email) {
      warn!("Invalid email format provided for signup.");
      return Err(AppError::Validation("Valid email is required.".to_string()));
    }
    auth_service::validate_password_policy(&guard.password)?;
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("check_existing_user", |ctx_data: ContextData<SignupCtxData>| async move {
    let (email, db_pool) = {
      let guard = ctx_data.read();
      (guard.email.clone(), guard.app_state.db_pool.clone())
    };

    if UserRepo::email_exists(&db_pool, &email).await? {
      warn!("Signup attempted with an existing email.");
      return Err(AppError::Validation("An account with this email already exists.".to_string()));
    }
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("create_user", |ctx_data: ContextData<SignupCtxData>| async move {
    let (name, email, password, role, db_pool) = {
      let guard = ctx_data.read();
      (
        guard.name.clone(),
        guard.email.clone(),
        guard.password.clone(),
        guard.role,
        guard.app_state.db_pool.clone(),
      )
    };

    let password_hash = tokio::task::spawn_blocking(move || auth_service::hash_password(&password))
      .await
      .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;
    // Two concurrent signups can both pass the existence check; the unique index decides.
    let user = UserRepo::create(&db_pool, &name, &email, &password_hash, role)
      .await
      .map_err(|e| match AppError::from(e).classify() {
        AppError::Conflict(_) => AppError::Validation("An account with this email already exists.".to_string()),
        other => other,
      })?;

    info!(user_id = %user.id, "User created.");
    ctx_data.write().created_user = Some(user);
    Ok::<_, AppError>(Control::Continue)
  });

  p.on("send_welcome_email", |ctx_data: ContextData<SignupCtxData>| async move {
    let email_ctx = {
      let guard = ctx_data.read();
      SendWelcomeEmailCtxData {
        app_state: guard.app_state.clone(),
        recipient_email: guard.email.clone(),
        recipient_name: guard.name.clone(),
      }
    };
    common_steps::send_welcome_email_step(ContextData::new(email_ctx)).await?;
    ctx_data.write().welcome_email_sent = true;
    Ok::<_, AppError>(Control::Continue)
  });

  p.skip_if("issue_token", |ctx_data: &ContextData<SignupCtxData>| !ctx_data.read().issue_session)?;
  p.on("issue_token", |ctx_data: ContextData<SignupCtxData>| async move {
    let mut guard = ctx_data.write();
    let user = guard
      .created_user
      .as_ref()
      .ok_or_else(|| AppError::Internal("Signup reached token issue without a user.".to_string()))?;
    let token = token_service::issue_token(user.id, user.role, &guard.app_state.config)?;
    debug!("Session token issued.");
    guard.token = Some(token);
    Ok::<_, AppError>(Control::Continue)
  });

  Ok(p)
}

pub fn register_signup_pipeline(flows: &Flows<AppError>) -> FlowResult<()> {
  flows.register(build_signup_pipeline()?);
  info!("Sign-up pipeline registered.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::user::tests::sample_user;
  use crate::models::UserRole;
  use crate::state::tests::lazy_state;
  use shopflow::RunOutcome;

  /// The signup pipeline minus its DB steps, with the user already "created".
  fn offline_signup(email: &str) -> (Pipeline<SignupCtxData, AppError>, ContextData<SignupCtxData>) {
    let mut p = build_signup_pipeline().unwrap();
    p.remove_step("check_existing_user").unwrap();
    p.remove_step("create_user").unwrap();

    let mut data = SignupCtxData::new(lazy_state(), "Ada".into(), email.into(), "correct-horse-1".into());
    data.created_user = Some(sample_user(email, UserRole::Customer));
    (p, ContextData::new(data))
  }

  #[tokio::test]
  async fn failed_welcome_email_does_not_block_signup() {
    let (p, ctx) = offline_signup("ada@example.invalid");
    assert_eq!(p.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);

    let data = ctx.read();
    assert!(!data.welcome_email_sent);
    assert!(data.token.is_some());
  }

  #[tokio::test]
  async fn delivered_welcome_email_is_recorded() {
    let (p, ctx) = offline_signup("ada@example.com");
    assert_eq!(p.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);
    assert!(ctx.read().welcome_email_sent);
  }

  #[tokio::test]
  async fn admin_created_accounts_get_no_token() {
    let (p, ctx) = offline_signup("ada@example.com");
    ctx.write().issue_session = false;
    assert_eq!(p.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);
    assert!(ctx.read().token.is_none());
  }
}
