// storefront/src/models/product.rs

use crate::errors::{AppError, Result};
use crate::models::normalize_set;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender_enum")]
pub enum Gender {
  Men,
  Women,
  Unisex,
}

impl std::str::FromStr for Gender {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "Men" => Ok(Gender::Men),
      "Women" => Ok(Gender::Women),
      "Unisex" => Ok(Gender::Unisex),
      other => Err(AppError::Validation(format!(
        "Invalid gender '{}': expected Men, Women or Unisex.",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
  pub url: String,
  #[serde(default)]
  pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
  pub length: f64,
  pub width: f64,
  pub height: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price_cents: i32,
  pub currency: String,
  pub discount_price_cents: Option<i32>,
  pub count_in_stock: i32,
  pub sku: String,
  pub category: String,
  pub brand: Option<String>,
  pub collection: Option<String>,
  pub material: Option<String>,
  pub gender: Option<Gender>,
  pub sizes: Vec<String>,
  pub colors: Vec<String>,
  pub images: Json<Vec<ProductImage>>,
  pub is_featured: bool,
  pub is_published: bool,
  pub rating: f64,
  pub num_reviews: i32,
  pub tags: Vec<String>,
  pub user_id: Option<Uuid>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub meta_keywords: Option<String>,
  pub dimensions: Json<Dimensions>,
  pub weight: f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// Unit price a buyer pays: the discount price when it undercuts the list price.
  pub fn effective_price_cents(&self) -> i32 {
    match self.discount_price_cents {
      Some(d) if d < self.price_cents => d,
      _ => self.price_cents,
    }
  }

  pub fn primary_image_url(&self) -> Option<String> {
    self.images.0.first().map(|img| img.url.clone())
  }
}

fn default_currency() -> String {
  "USD".to_string()
}

/// Admin payload for `POST /api/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price_cents: i32,
  #[serde(default = "default_currency")]
  pub currency: String,
  pub discount_price_cents: Option<i32>,
  #[serde(default)]
  pub count_in_stock: i32,
  pub sku: String,
  pub category: String,
  pub brand: Option<String>,
  pub collection: Option<String>,
  pub material: Option<String>,
  pub gender: Option<Gender>,
  #[serde(default)]
  pub sizes: Vec<String>,
  #[serde(default)]
  pub colors: Vec<String>,
  #[serde(default)]
  pub images: Vec<ProductImage>,
  #[serde(default)]
  pub is_featured: bool,
  #[serde(default)]
  pub is_published: bool,
  #[serde(default)]
  pub tags: Vec<String>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub meta_keywords: Option<String>,
  #[serde(default)]
  pub dimensions: Dimensions,
  #[serde(default)]
  pub weight: f64,
}

impl NewProduct {
  /// Validates and normalizes the payload in place.
  pub fn validated(mut self) -> Result<Self> {
    self.name = self.name.trim().to_string();
    self.sku = self.sku.trim().to_string();
    self.category = self.category.trim().to_string();
    self.currency = self.currency.trim().to_uppercase();
    self.sizes = normalize_set(self.sizes);
    self.colors = normalize_set(self.colors);
    self.tags = normalize_set(self.tags);

    if self.name.is_empty() {
      return Err(AppError::Validation("Product name is required.".to_string()));
    }
    if self.sku.is_empty() {
      return Err(AppError::Validation("SKU is required.".to_string()));
    }
    if self.category.is_empty() {
      return Err(AppError::Validation("Category is required.".to_string()));
    }
    validate_money_and_measures(
      self.price_cents,
      self.discount_price_cents,
      self.count_in_stock,
      &self.currency,
      &self.dimensions,
      self.weight,
    )?;
    validate_images(&self.images)?;
    Ok(self)
  }
}

/// Partial update for `PUT /api/products/{id}`: absent fields keep their value.
///
/// `discountPriceCents: null` is indistinguishable from absence here; clearing
/// a discount is done by sending the list price or a value at or above it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i32>,
  pub currency: Option<String>,
  pub discount_price_cents: Option<i32>,
  pub count_in_stock: Option<i32>,
  pub sku: Option<String>,
  pub category: Option<String>,
  pub brand: Option<String>,
  pub collection: Option<String>,
  pub material: Option<String>,
  pub gender: Option<Gender>,
  pub sizes: Option<Vec<String>>,
  pub colors: Option<Vec<String>>,
  pub images: Option<Vec<ProductImage>>,
  pub is_featured: Option<bool>,
  pub is_published: Option<bool>,
  pub tags: Option<Vec<String>>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub meta_keywords: Option<String>,
  pub dimensions: Option<Dimensions>,
  pub weight: Option<f64>,
}

impl ProductPatch {
  /// Applies the patch to `product` and validates the result.
  pub fn apply(self, product: &mut Product) -> Result<()> {
    if let Some(v) = self.name {
      let v = v.trim().to_string();
      if v.is_empty() {
        return Err(AppError::Validation("Product name cannot be empty.".to_string()));
      }
      product.name = v;
    }
    if let Some(v) = self.description {
      product.description = v;
    }
    if let Some(v) = self.price_cents {
      product.price_cents = v;
    }
    if let Some(v) = self.currency {
      product.currency = v.trim().to_uppercase();
    }
    if let Some(v) = self.discount_price_cents {
      product.discount_price_cents = Some(v);
    }
    if let Some(v) = self.count_in_stock {
      product.count_in_stock = v;
    }
    if let Some(v) = self.sku {
      let v = v.trim().to_string();
      if v.is_empty() {
        return Err(AppError::Validation("SKU cannot be empty.".to_string()));
      }
      product.sku = v;
    }
    if let Some(v) = self.category {
      let v = v.trim().to_string();
      if v.is_empty() {
        return Err(AppError::Validation("Category cannot be empty.".to_string()));
      }
      product.category = v;
    }
    if let Some(v) = self.brand {
      product.brand = Some(v);
    }
    if let Some(v) = self.collection {
      product.collection = Some(v);
    }
    if let Some(v) = self.material {
      product.material = Some(v);
    }
    if let Some(v) = self.gender {
      product.gender = Some(v);
    }
    if let Some(v) = self.sizes {
      product.sizes = normalize_set(v);
    }
    if let Some(v) = self.colors {
      product.colors = normalize_set(v);
    }
    if let Some(v) = self.images {
      validate_images(&v)?;
      product.images = Json(v);
    }
    if let Some(v) = self.is_featured {
      product.is_featured = v;
    }
    if let Some(v) = self.is_published {
      product.is_published = v;
    }
    if let Some(v) = self.tags {
      product.tags = normalize_set(v);
    }
    if let Some(v) = self.meta_title {
      product.meta_title = Some(v);
    }
    if let Some(v) = self.meta_description {
      product.meta_description = Some(v);
    }
    if let Some(v) = self.meta_keywords {
      product.meta_keywords = Some(v);
    }
    if let Some(v) = self.dimensions {
      product.dimensions = Json(v);
    }
    if let Some(v) = self.weight {
      product.weight = v;
    }

    validate_money_and_measures(
      product.price_cents,
      product.discount_price_cents,
      product.count_in_stock,
      &product.currency,
      &product.dimensions.0,
      product.weight,
    )
  }
}

fn validate_money_and_measures(
  price_cents: i32,
  discount_price_cents: Option<i32>,
  count_in_stock: i32,
  currency: &str,
  dimensions: &Dimensions,
  weight: f64,
) -> Result<()> {
  if price_cents < 0 {
    return Err(AppError::Validation("Price cannot be negative.".to_string()));
  }
  if discount_price_cents.is_some_and(|d| d < 0) {
    return Err(AppError::Validation("Discount price cannot be negative.".to_string()));
  }
  if count_in_stock < 0 {
    return Err(AppError::Validation("Stock count cannot be negative.".to_string()));
  }
  if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
    return Err(AppError::Validation("Currency must be a 3-letter ISO code.".to_string()));
  }
  let measures = [dimensions.length, dimensions.width, dimensions.height, weight];
  if measures.iter().any(|m| !m.is_finite() || *m < 0.0) {
    return Err(AppError::Validation("Dimensions and weight must be non-negative numbers.".to_string()));
  }
  Ok(())
}

fn validate_images(images: &[ProductImage]) -> Result<()> {
  if images.iter().any(|img| img.url.trim().is_empty()) {
    return Err(AppError::Validation("Every product image needs a url.".to_string()));
  }
  Ok(())
}
