// storefront/src/models/subscriber.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
  pub id: Uuid,
  pub email: String,
  pub subscribed_at: DateTime<Utc>,
}
