// storefront/src/db/order_repo.rs

use crate::models::{CheckoutView, Order, OrderItem, OrderStatus, OrderView};
use sqlx::{PgConnection, PgExecutor};
use tracing::instrument;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "\
  id, user_id, checkout_id, shipping_address, payment_method, total_price_cents, currency, \
  is_paid, paid_at, payment_status, is_delivered, delivered_at, status, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, name, image, price_cents, size, color, quantity";

pub struct OrderRepo;

impl OrderRepo {
  /// Copies a finalized checkout into a new order with the same lines.
  /// Run inside the finalize transaction.
  #[instrument(name = "order_repo::create_from_checkout", skip(conn, source), fields(checkout_id = %source.checkout.id), err(Display))]
  pub async fn create_from_checkout(conn: &mut PgConnection, source: &CheckoutView) -> Result<OrderView, sqlx::Error> {
    let c = &source.checkout;
    let query = format!(
      "INSERT INTO orders (\
         id, user_id, checkout_id, shipping_address, payment_method, total_price_cents, currency, \
         is_paid, paid_at, payment_status\
       ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&query)
      .bind(Uuid::new_v4())
      .bind(c.user_id)
      .bind(c.id)
      .bind(&c.shipping_address)
      .bind(&c.payment_method)
      .bind(c.total_price_cents)
      .bind(&c.currency)
      .bind(c.is_paid)
      .bind(c.paid_at)
      .bind(c.payment_status)
      .fetch_one(&mut *conn)
      .await?;

    let query = format!(
      "INSERT INTO order_items (id, order_id, product_id, name, image, price_cents, size, color, quantity) \
       SELECT gen_random_uuid(), $1, product_id, name, image, price_cents, size, color, quantity \
       FROM checkout_items WHERE checkout_id = $2 \
       RETURNING {ITEM_COLUMNS}"
    );
    let order_items = sqlx::query_as::<_, OrderItem>(&query)
      .bind(order.id)
      .bind(c.id)
      .fetch_all(&mut *conn)
      .await?;

    Ok(OrderView { order, order_items })
  }

  pub async fn list_for_user<'e>(exec: impl PgExecutor<'e>, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC");
    sqlx::query_as::<_, Order>(&query).bind(user_id).fetch_all(exec).await
  }

  pub async fn list_all<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<Order>, sqlx::Error> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
    sqlx::query_as::<_, Order>(&query).fetch_all(exec).await
  }

  pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    sqlx::query_as::<_, Order>(&query).bind(id).fetch_optional(exec).await
  }

  pub async fn items<'e>(exec: impl PgExecutor<'e>, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY name, size, color");
    sqlx::query_as::<_, OrderItem>(&query).bind(order_id).fetch_all(exec).await
  }

  /// Sets the status; `delivered` also stamps the delivery fields.
  #[instrument(name = "order_repo::update_status", skip(exec), err(Display))]
  pub async fn update_status<'e>(exec: impl PgExecutor<'e>, id: Uuid, status: OrderStatus) -> Result<Option<Order>, sqlx::Error> {
    let query = format!(
      "UPDATE orders SET status = $2, \
         is_delivered = CASE WHEN $2 = 'delivered'::order_status_enum THEN TRUE ELSE is_delivered END, \
         delivered_at = CASE WHEN $2 = 'delivered'::order_status_enum THEN COALESCE(delivered_at, now()) ELSE delivered_at END, \
         updated_at = now() \
       WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    );
    sqlx::query_as::<_, Order>(&query)
      .bind(id)
      .bind(status)
      .fetch_optional(exec)
      .await
  }

  pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
  }
}
