// storefront/src/models/mod.rs

//! Database records and the request payloads that create or change them.

pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod review;
pub mod subscriber;
pub mod user;

pub use cart::{Cart, CartItem, CartOwner, CartView};
pub use checkout::{Checkout, CheckoutItem, CheckoutView, NewCheckoutLine, PaymentStatus, ShippingAddress};
pub use order::{Order, OrderItem, OrderStatus, OrderView};
pub use product::{Dimensions, Gender, NewProduct, Product, ProductImage, ProductPatch};
pub use review::{NewReview, Review};
pub use subscriber::Subscriber;
pub use user::{User, UserRole};

/// Minimal email shape check shared by registration, admin and subscription.
pub fn is_plausible_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && !email.contains(char::is_whitespace)
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

/// Treats a list of strings as a set: trims, drops empties, removes duplicates keeping first occurrence.
pub fn normalize_set(values: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(values.len());
  for v in values {
    let v = v.trim();
    if !v.is_empty() && !out.iter().any(|o| o == v) {
      out.push(v.to_string());
    }
  }
  out
}
