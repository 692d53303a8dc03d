// storefront/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
  User(Uuid),
  Guest(String),
}

impl std::fmt::Display for CartOwner {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CartOwner::User(id) => write!(f, "user:{}", id),
      CartOwner::Guest(id) => write!(f, "guest:{}", id),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Option<Uuid>,
  pub guest_id: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// One cart line. `size` and `color` are empty strings when the product has no such axis.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub name: String,
  pub image: Option<String>,
  pub price_cents: i32,
  pub size: String,
  pub color: String,
  pub quantity: i32,
}

impl CartItem {
  pub fn line_total_cents(&self) -> i64 {
    i64::from(self.price_cents) * i64::from(self.quantity)
  }
}

/// A cart as returned to clients: lines plus a derived total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  #[serde(flatten)]
  pub cart: Cart,
  pub products: Vec<CartItem>,
  pub total_price_cents: i64,
}

impl CartView {
  pub fn new(cart: Cart, products: Vec<CartItem>) -> Self {
    let total_price_cents = products.iter().map(CartItem::line_total_cents).sum();
    Self {
      cart,
      products,
      total_price_cents,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(price_cents: i32, quantity: i32) -> CartItem {
    CartItem {
      id: Uuid::new_v4(),
      cart_id: Uuid::nil(),
      product_id: Uuid::new_v4(),
      name: "Item".into(),
      image: None,
      price_cents,
      size: String::new(),
      color: String::new(),
      quantity,
    }
  }

  #[test]
  fn total_is_derived_from_lines() {
    let cart = Cart {
      id: Uuid::nil(),
      user_id: None,
      guest_id: Some("guest_1".into()),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    };
    let view = CartView::new(cart, vec![line(1500, 2), line(999, 1)]);
    assert_eq!(view.total_price_cents, 3999);

    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["guestId"], "guest_1");
    assert_eq!(value["totalPriceCents"], 3999);
    assert_eq!(value["products"].as_array().map(Vec::len), Some(2));
  }

  #[test]
  fn line_total_does_not_overflow_i32() {
    assert_eq!(line(i32::MAX, 2).line_total_cents(), 2 * i64::from(i32::MAX));
  }
}
