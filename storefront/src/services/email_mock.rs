// storefront/src/services/email_mock.rs
use crate::errors::{AppError, Result as AppResult};
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct SentEmailInfo {
  pub message_id: String,
}

/// Logs the email instead of delivering it. Recipients on `example.invalid`
/// fail, so the failure path can be exercised.
#[instrument(name = "email_mock::send", skip(html_body), err(Display))]
pub async fn send_mock_email(to: &str, from: &str, subject: &str, html_body: &str) -> AppResult<SentEmailInfo> {
  tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

  if to.ends_with("@example.invalid") {
    warn!("Simulated email delivery failure.");
    return Err(AppError::Internal("Simulated email send failure".to_string()));
  }

  let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
  info!(%message_id, body_len = html_body.len(), "Mock email sent.");
  Ok(SentEmailInfo { message_id })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn invalid_domain_fails() {
    assert!(send_mock_email("a@example.invalid", "shop@x.io", "Hi", "<p/>").await.is_err());
    let sent = send_mock_email("a@example.com", "shop@x.io", "Hi", "<p/>").await.unwrap();
    assert!(sent.message_id.starts_with("mock_email_"));
  }
}
