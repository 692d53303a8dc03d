// storefront/src/services/token_service.rs

//! HS256 bearer tokens.

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::UserRole;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// User id.
  pub sub: Uuid,
  pub role: UserRole,
  pub iat: i64,
  pub exp: i64,
}

#[instrument(name = "token_service::issue", skip(config), err(Display))]
pub fn issue_token(user_id: Uuid, role: UserRole, config: &AppConfig) -> Result<String, AppError> {
  issue_with_secret(user_id, role, &config.jwt_secret, config.jwt_expiry_hours)
}

pub fn validate_token(token: &str, config: &AppConfig) -> Result<Claims, AppError> {
  validate_with_secret(token, &config.jwt_secret)
}

fn issue_with_secret(user_id: Uuid, role: UserRole, secret: &str, expiry_hours: i64) -> Result<String, AppError> {
  let now = chrono::Utc::now().timestamp();
  let claims = Claims {
    sub: user_id,
    role,
    iat: now,
    exp: now + expiry_hours * 3600,
  };
  encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

fn validate_with_secret(token: &str, secret: &str) -> Result<Claims, AppError> {
  decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
    .map(|data| data.claims)
    .map_err(|e| {
      debug!(error = %e, "Bearer token rejected.");
      AppError::Auth("Invalid or expired token.".to_string())
    })
}
