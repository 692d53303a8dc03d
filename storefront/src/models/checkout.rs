// storefront/src/models/checkout.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub address: String,
  pub city: String,
  pub postal_code: String,
  pub country: String,
}

impl ShippingAddress {
  pub fn validated(self) -> Result<Self> {
    let trimmed = ShippingAddress {
      address: self.address.trim().to_string(),
      city: self.city.trim().to_string(),
      postal_code: self.postal_code.trim().to_string(),
      country: self.country.trim().to_string(),
    };
    for (field, value) in [
      ("address", &trimmed.address),
      ("city", &trimmed.city),
      ("postalCode", &trimmed.postal_code),
      ("country", &trimmed.country),
    ] {
      if value.is_empty() {
        return Err(AppError::Validation(format!("Shipping {} is required.", field)));
      }
    }
    Ok(trimmed)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
  pub id: Uuid,
  pub user_id: Uuid,
  pub shipping_address: Json<ShippingAddress>,
  pub payment_method: String,
  pub total_price_cents: i64,
  pub currency: String,
  pub payment_status: PaymentStatus,
  pub payment_details: Option<Json<serde_json::Value>>,
  pub is_paid: bool,
  pub paid_at: Option<DateTime<Utc>>,
  pub is_finalized: bool,
  pub finalized_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Checkout line, priced when the checkout was created. `product_id` is
/// cleared if the product is later deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
  pub id: Uuid,
  pub checkout_id: Uuid,
  pub product_id: Option<Uuid>,
  pub name: String,
  pub image: Option<String>,
  pub price_cents: i32,
  pub size: String,
  pub color: String,
  pub quantity: i32,
}

/// A line about to be written into a new checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckoutLine {
  pub product_id: Uuid,
  pub name: String,
  pub image: Option<String>,
  pub price_cents: i32,
  pub size: String,
  pub color: String,
  pub quantity: i32,
}

impl NewCheckoutLine {
  pub fn line_total_cents(&self) -> i64 {
    i64::from(self.price_cents) * i64::from(self.quantity)
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
  #[serde(flatten)]
  pub checkout: Checkout,
  pub checkout_items: Vec<CheckoutItem>,
}
