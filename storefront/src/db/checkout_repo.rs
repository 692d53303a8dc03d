// storefront/src/db/checkout_repo.rs

use crate::models::{Checkout, CheckoutItem, CheckoutView, NewCheckoutLine, ShippingAddress};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const CHECKOUT_COLUMNS: &str = "\
  id, user_id, shipping_address, payment_method, total_price_cents, currency, \
  payment_status, payment_details, is_paid, paid_at, is_finalized, finalized_at, \
  created_at, updated_at";
const ITEM_COLUMNS: &str = "id, checkout_id, product_id, name, image, price_cents, size, color, quantity";

pub struct CheckoutRepo;

impl CheckoutRepo {
  /// Inserts the checkout and its lines. Run inside a transaction.
  #[instrument(name = "checkout_repo::create", skip(conn, address, lines), fields(num_lines = lines.len()), err(Display))]
  pub async fn create(
    conn: &mut PgConnection,
    user_id: Uuid,
    address: &ShippingAddress,
    payment_method: &str,
    currency: &str,
    lines: &[NewCheckoutLine],
  ) -> Result<CheckoutView, sqlx::Error> {
    let total: i64 = lines.iter().map(NewCheckoutLine::line_total_cents).sum();
    let query = format!(
      "INSERT INTO checkouts (id, user_id, shipping_address, payment_method, total_price_cents, currency) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CHECKOUT_COLUMNS}"
    );
    let checkout = sqlx::query_as::<_, Checkout>(&query)
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(Json(address))
      .bind(payment_method)
      .bind(total)
      .bind(currency)
      .fetch_one(&mut *conn)
      .await?;

    if lines.is_empty() {
      return Ok(CheckoutView {
        checkout,
        checkout_items: Vec::new(),
      });
    }

    let mut qb = QueryBuilder::<Postgres>::new(
      "INSERT INTO checkout_items (id, checkout_id, product_id, name, image, price_cents, size, color, quantity) ",
    );
    qb.push_values(lines, |mut row, line| {
      row
        .push_bind(Uuid::new_v4())
        .push_bind(checkout.id)
        .push_bind(line.product_id)
        .push_bind(&line.name)
        .push_bind(&line.image)
        .push_bind(line.price_cents)
        .push_bind(&line.size)
        .push_bind(&line.color)
        .push_bind(line.quantity);
    });
    qb.push(format!(" RETURNING {ITEM_COLUMNS}"));
    let checkout_items = qb.build_query_as::<CheckoutItem>().fetch_all(&mut *conn).await?;

    Ok(CheckoutView {
      checkout,
      checkout_items,
    })
  }

  /// The checkout if it exists and belongs to `user_id`.
  pub async fn find_for_user<'e>(exec: impl PgExecutor<'e>, id: Uuid, user_id: Uuid) -> Result<Option<Checkout>, sqlx::Error> {
    let query = format!("SELECT {CHECKOUT_COLUMNS} FROM checkouts WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, Checkout>(&query)
      .bind(id)
      .bind(user_id)
      .fetch_optional(exec)
      .await
  }

  pub async fn items<'e>(exec: impl PgExecutor<'e>, checkout_id: Uuid) -> Result<Vec<CheckoutItem>, sqlx::Error> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM checkout_items WHERE checkout_id = $1 ORDER BY name, size, color");
    sqlx::query_as::<_, CheckoutItem>(&query)
      .bind(checkout_id)
      .fetch_all(exec)
      .await
  }

  /// Records a successful payment on a checkout that is not finalized yet.
  /// `None` means no such unfinalized checkout for the user.
  #[instrument(name = "checkout_repo::mark_paid", skip(exec, details), err(Display))]
  pub async fn mark_paid<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    user_id: Uuid,
    details: Option<&serde_json::Value>,
  ) -> Result<Option<Checkout>, sqlx::Error> {
    let query = format!(
      "UPDATE checkouts SET payment_status = 'paid', is_paid = TRUE, paid_at = now(), \
         payment_details = $3, updated_at = now() \
       WHERE id = $1 AND user_id = $2 AND is_finalized = FALSE \
       RETURNING {CHECKOUT_COLUMNS}"
    );
    sqlx::query_as::<_, Checkout>(&query)
      .bind(id)
      .bind(user_id)
      .bind(details.map(Json))
      .fetch_optional(exec)
      .await
  }

  /// Flips `is_finalized` on a paid checkout exactly once. `false` means another
  /// request already finalized it (or it is unpaid).
  #[instrument(name = "checkout_repo::claim_for_finalize", skip(exec), err(Display))]
  pub async fn claim_for_finalize<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
      "UPDATE checkouts SET is_finalized = TRUE, finalized_at = now(), updated_at = now() \
       WHERE id = $1 AND is_paid = TRUE AND is_finalized = FALSE",
    )
    .bind(id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected() == 1)
  }
}
