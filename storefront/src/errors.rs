// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use shopflow::FlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payload Too Large: {0}")]
  PayloadTooLarge(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

/// Postgres SQLSTATE codes surfaced as conflicts.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

impl AppError {
  /// Maps well-known database failures onto client-facing errors; others pass through.
  pub fn classify(self) -> Self {
    let AppError::Sqlx(sqlx_err) = self else {
      return self;
    };
    let mapped = match &sqlx_err {
      sqlx::Error::RowNotFound => Some(AppError::NotFound("Resource not found.".to_string())),
      sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) => Some(AppError::Conflict(match db_err.constraint() {
          Some(constraint) => format!("A record with the same unique value already exists ({}).", constraint),
          None => "A record with the same unique value already exists.".to_string(),
        })),
        Some(CHECK_VIOLATION) => Some(AppError::Conflict("The change violates a data constraint.".to_string())),
        Some(FOREIGN_KEY_VIOLATION) => Some(AppError::Conflict("The record is referenced by other records.".to_string())),
        _ => None,
      },
      _ => None,
    };
    mapped.unwrap_or(AppError::Sqlx(sqlx_err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      AppError::Sqlx(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
      AppError::Sqlx(sqlx::Error::Database(db_err))
        if matches!(
          db_err.code().as_deref(),
          Some(UNIQUE_VIOLATION | CHECK_VIOLATION | FOREIGN_KEY_VIOLATION)
        ) =>
      {
        StatusCode::CONFLICT
      }
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Io(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }

    let message = match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::PayloadTooLarge(m) => m.clone(),
      AppError::Sqlx(_) if status == StatusCode::NOT_FOUND => "Resource not found.".to_string(),
      AppError::Sqlx(_) if status == StatusCode::CONFLICT => "The request conflicts with existing data.".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Io(_) => "Storage operation failed".to_string(),
      AppError::Workflow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    };

    HttpResponse::build(status).json(json!({ "error": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  #[test]
  fn client_errors_map_to_their_status() {
    assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    assert_eq!(AppError::PayloadTooLarge("x".into()).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
  }

  #[test]
  fn row_not_found_is_404() {
    assert_eq!(AppError::Sqlx(sqlx::Error::RowNotFound).status_code(), StatusCode::NOT_FOUND);
    assert!(matches!(AppError::Sqlx(sqlx::Error::RowNotFound).classify(), AppError::NotFound(_)));
  }

  #[test]
  fn workflow_errors_are_500() {
    let err = AppError::from(FlowError::HandlerMissing {
      step_name: "s".into(),
    });
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[actix_rt::test]
  async fn body_is_error_json_without_internal_detail() {
    let resp = AppError::Internal("db password leaked here".into()).error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(resp.into_body()).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({"error": "An internal error occurred"}));
  }

  #[actix_rt::test]
  async fn body_carries_client_message() {
    let resp = AppError::NotFound("Product not found.".into()).error_response();
    let body = to_bytes(resp.into_body()).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error"], "Product not found.");
  }
}
