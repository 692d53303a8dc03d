// storefront/src/web/extractors.rs

//! Request extractors for bearer-token authentication.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::UserRole;
use crate::services::token_service;
use crate::state::AppState;

/// The caller identified by a valid `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: UserRole,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == UserRole::Admin
  }
}

/// An authenticated caller whose token carries the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

/// Authentication when present. A malformed or expired token is still a 401.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AppError> {
  let Some(value) = req.headers().get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| AppError::Auth("Malformed Authorization header.".to_string()))?;
  match value.strip_prefix("Bearer ") {
    Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
    _ => Err(AppError::Auth("Authorization header must be a Bearer token.".to_string())),
  }
}

fn authenticate(req: &HttpRequest) -> Result<Option<AuthenticatedUser>, AppError> {
  let Some(token) = bearer_token(req)? else {
    return Ok(None);
  };
  let app_state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let claims = token_service::validate_token(token, &app_state.config)?;
  Ok(Some(AuthenticatedUser {
    user_id: claims.sub,
    role: claims.role,
  }))
}

fn require_authenticated(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  authenticate(req)?.ok_or_else(|| {
    warn!(path = %req.path(), "Request without a bearer token.");
    AppError::Auth("Not authorized, no token.".to_string())
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(require_authenticated(req))
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = require_authenticated(req).and_then(|user| {
      if user.is_admin() {
        Ok(AdminUser(user))
      } else {
        warn!(user_id = %user.user_id, path = %req.path(), "Non-admin attempted an admin route.");
        Err(AppError::Forbidden("Not authorized as an admin.".to_string()))
      }
    });
    ready(result)
  }
}

impl FromRequest for OptionalUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req).map(OptionalUser))
  }
}
