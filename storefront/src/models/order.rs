// storefront/src/models/order.rs

use crate::models::checkout::{PaymentStatus, ShippingAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub checkout_id: Option<Uuid>,
  pub shipping_address: Json<ShippingAddress>,
  pub payment_method: String,
  pub total_price_cents: i64,
  pub currency: String,
  pub is_paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub payment_status: PaymentStatus,
  pub is_delivered: bool,
  pub delivered_at: Option<DateTime<Utc>>,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Option<Uuid>,
  pub name: String,
  pub image: Option<String>,
  pub price_cents: i32,
  pub size: String,
  pub color: String,
  pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
  #[serde(flatten)]
  pub order: Order,
  pub order_items: Vec<OrderItem>,
}
