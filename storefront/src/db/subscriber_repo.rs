// storefront/src/db/subscriber_repo.rs

use crate::models::Subscriber;
use sqlx::PgExecutor;
use uuid::Uuid;

pub struct SubscriberRepo;

impl SubscriberRepo {
  /// `None` when the email is already subscribed.
  pub async fn create<'e>(exec: impl PgExecutor<'e>, email: &str) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>(
      "INSERT INTO subscribers (id, email) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING \
       RETURNING id, email, subscribed_at",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .fetch_optional(exec)
    .await
  }
}
