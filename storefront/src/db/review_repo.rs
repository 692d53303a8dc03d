// storefront/src/db/review_repo.rs

use crate::models::Review;
use sqlx::{PgConnection, PgExecutor};
use tracing::instrument;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, product_id, user_id, name, rating, comment, created_at";

pub struct ReviewRepo;

impl ReviewRepo {
  /// Inserts the review and folds it into the product's rating aggregate.
  /// Run inside a transaction; a second review by the same user violates the
  /// unique index.
  #[instrument(name = "review_repo::create", skip(conn, comment), err(Display))]
  pub async fn create(
    conn: &mut PgConnection,
    product_id: Uuid,
    user_id: Uuid,
    reviewer_name: &str,
    rating: i32,
    comment: &str,
  ) -> Result<Review, sqlx::Error> {
    let query = format!(
      "INSERT INTO reviews (id, product_id, user_id, name, rating, comment) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REVIEW_COLUMNS}"
    );
    let review = sqlx::query_as::<_, Review>(&query)
      .bind(Uuid::new_v4())
      .bind(product_id)
      .bind(user_id)
      .bind(reviewer_name)
      .bind(rating)
      .bind(comment)
      .fetch_one(&mut *conn)
      .await?;

    sqlx::query(
      "UPDATE products SET \
         rating = (rating * num_reviews + $2) / (num_reviews + 1), \
         num_reviews = num_reviews + 1, \
         updated_at = now() \
       WHERE id = $1",
    )
    .bind(product_id)
    .bind(f64::from(rating))
    .execute(&mut *conn)
    .await?;

    Ok(review)
  }

  pub async fn list_for_product<'e>(exec: impl PgExecutor<'e>, product_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
    let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC");
    sqlx::query_as::<_, Review>(&query)
      .bind(product_id)
      .fetch_all(exec)
      .await
  }
}
