// storefront/src/db/product_repo.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Gender, NewProduct, Product};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "\
  id, name, description, price_cents, currency, discount_price_cents, count_in_stock, \
  sku, category, brand, collection, material, gender, sizes, colors, images, \
  is_featured, is_published, rating, num_reviews, tags, user_id, \
  meta_title, meta_description, meta_keywords, dimensions, weight, \
  created_at, updated_at";

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 200;
const NEW_ARRIVALS_LIMIT: i64 = 8;
const SIMILAR_LIMIT: i64 = 4;

/// Query-string filters for the public product listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
  pub collection: Option<String>,
  pub category: Option<String>,
  pub material: Option<String>,
  pub brand: Option<String>,
  pub size: Option<String>,
  pub color: Option<String>,
  pub gender: Option<String>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub search: Option<String>,
  pub sort_by: Option<String>,
  pub limit: Option<i64>,
}

fn csv(raw: &Option<String>) -> Vec<String> {
  raw
    .as_deref()
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
  raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Escapes `%`, `_` and `\` so user input matches literally under LIKE.
pub fn escape_like(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for c in input.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

fn units_to_cents(units: f64, key: &str) -> AppResult<i64> {
  if !units.is_finite() || units < 0.0 {
    return Err(AppError::Validation(format!("{} must be a non-negative number.", key)));
  }
  Ok((units * 100.0).round() as i64)
}

impl ProductFilter {
  /// Builds the listing query for published products.
  pub fn to_query(&self) -> AppResult<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_published = TRUE"));

    if let Some(collection) = non_empty(&self.collection) {
      qb.push(" AND collection = ").push_bind(collection.to_string());
    }
    if let Some(category) = non_empty(&self.category).filter(|c| !c.eq_ignore_ascii_case("all")) {
      qb.push(" AND category = ").push_bind(category.to_string());
    }
    let materials = csv(&self.material);
    if !materials.is_empty() {
      qb.push(" AND material = ANY(").push_bind(materials).push(")");
    }
    let brands = csv(&self.brand);
    if !brands.is_empty() {
      qb.push(" AND brand = ANY(").push_bind(brands).push(")");
    }
    let sizes = csv(&self.size);
    if !sizes.is_empty() {
      qb.push(" AND sizes && ").push_bind(sizes);
    }
    let colors = csv(&self.color);
    if !colors.is_empty() {
      qb.push(" AND colors && ").push_bind(colors);
    }
    if let Some(gender) = non_empty(&self.gender) {
      let gender: Gender = gender.parse()?;
      qb.push(" AND gender = ").push_bind(gender);
    }
    if let Some(min) = self.min_price {
      qb.push(" AND price_cents >= ").push_bind(units_to_cents(min, "minPrice")?);
    }
    if let Some(max) = self.max_price {
      qb.push(" AND price_cents <= ").push_bind(units_to_cents(max, "maxPrice")?);
    }
    if let Some(search) = non_empty(&self.search) {
      let pattern = format!("%{}%", escape_like(search));
      qb.push(" AND (name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR description ILIKE ")
        .push_bind(pattern)
        .push(")");
    }

    let order_by = match non_empty(&self.sort_by) {
      None => "created_at DESC",
      Some("priceAsc") => "price_cents ASC, created_at DESC",
      Some("priceDesc") => "price_cents DESC, created_at DESC",
      Some("popularity") => "rating DESC, num_reviews DESC, created_at DESC",
      Some(other) => {
        return Err(AppError::Validation(format!(
          "Invalid sortBy '{}': expected priceAsc, priceDesc or popularity.",
          other
        )))
      }
    };
    qb.push(" ORDER BY ").push(order_by);

    let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
    if limit <= 0 {
      return Err(AppError::Validation("limit must be positive.".to_string()));
    }
    qb.push(" LIMIT ").push_bind(limit.min(MAX_LIMIT));
    Ok(qb)
  }
}

pub struct ProductRepo;

impl ProductRepo {
  #[instrument(name = "product_repo::create", skip(exec, input), fields(sku = %input.sku), err(Display))]
  pub async fn create<'e>(exec: impl PgExecutor<'e>, input: &NewProduct, owner: Option<Uuid>) -> Result<Product, sqlx::Error> {
    let query = format!(
      "INSERT INTO products (\
         id, name, description, price_cents, currency, discount_price_cents, count_in_stock, \
         sku, category, brand, collection, material, gender, sizes, colors, images, \
         is_featured, is_published, tags, user_id, meta_title, meta_description, meta_keywords, \
         dimensions, weight\
       ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19, $20, $21, $22, $23, $24, $25) \
       RETURNING {PRODUCT_COLUMNS}"
    );
    sqlx::query_as::<_, Product>(&query)
      .bind(Uuid::new_v4())
      .bind(&input.name)
      .bind(&input.description)
      .bind(input.price_cents)
      .bind(&input.currency)
      .bind(input.discount_price_cents)
      .bind(input.count_in_stock)
      .bind(&input.sku)
      .bind(&input.category)
      .bind(input.brand.as_deref())
      .bind(input.collection.as_deref())
      .bind(input.material.as_deref())
      .bind(input.gender)
      .bind(&input.sizes)
      .bind(&input.colors)
      .bind(Json(&input.images))
      .bind(input.is_featured)
      .bind(input.is_published)
      .bind(&input.tags)
      .bind(owner)
      .bind(input.meta_title.as_deref())
      .bind(input.meta_description.as_deref())
      .bind(input.meta_keywords.as_deref())
      .bind(Json(&input.dimensions))
      .bind(input.weight)
      .fetch_one(exec)
      .await
  }

  pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    sqlx::query_as::<_, Product>(&query).bind(id).fetch_optional(exec).await
  }

  pub async fn find_many<'e>(exec: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
    sqlx::query_as::<_, Product>(&query).bind(ids).fetch_all(exec).await
  }

  #[instrument(name = "product_repo::list", skip(exec), err(Display))]
  pub async fn list<'e>(exec: impl PgExecutor<'e>, filter: &ProductFilter) -> AppResult<Vec<Product>> {
    let mut qb = filter.to_query()?;
    Ok(qb.build_query_as::<Product>().fetch_all(exec).await?)
  }

  /// Every product, published or not.
  pub async fn list_all<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
    sqlx::query_as::<_, Product>(&query).fetch_all(exec).await
  }

  pub async fn best_seller<'e>(exec: impl PgExecutor<'e>) -> Result<Option<Product>, sqlx::Error> {
    let query = format!(
      "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_published = TRUE \
       ORDER BY rating DESC, num_reviews DESC, created_at DESC LIMIT 1"
    );
    sqlx::query_as::<_, Product>(&query).fetch_optional(exec).await
  }

  pub async fn new_arrivals<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_published = TRUE ORDER BY created_at DESC LIMIT $1");
    sqlx::query_as::<_, Product>(&query)
      .bind(NEW_ARRIVALS_LIMIT)
      .fetch_all(exec)
      .await
  }

  /// Published products sharing `product`'s gender and category, excluding itself.
  pub async fn similar<'e>(exec: impl PgExecutor<'e>, product: &Product) -> Result<Vec<Product>, sqlx::Error> {
    let query = format!(
      "SELECT {PRODUCT_COLUMNS} FROM products \
       WHERE is_published = TRUE AND id <> $1 AND category = $2 AND gender IS NOT DISTINCT FROM $3 \
       ORDER BY rating DESC, created_at DESC LIMIT $4"
    );
    sqlx::query_as::<_, Product>(&query)
      .bind(product.id)
      .bind(&product.category)
      .bind(product.gender)
      .bind(SIMILAR_LIMIT)
      .fetch_all(exec)
      .await
  }

  /// Writes every editable column of `product` back.
  #[instrument(name = "product_repo::update", skip(exec, product), fields(product_id = %product.id), err(Display))]
  pub async fn update<'e>(exec: impl PgExecutor<'e>, product: &Product) -> Result<Option<Product>, sqlx::Error> {
    let query = format!(
      "UPDATE products SET \
         name = $2, description = $3, price_cents = $4, currency = $5, discount_price_cents = $6, \
         count_in_stock = $7, sku = $8, category = $9, brand = $10, collection = $11, material = $12, \
         gender = $13, sizes = $14, colors = $15, images = $16, is_featured = $17, is_published = $18, \
         tags = $19, meta_title = $20, meta_description = $21, meta_keywords = $22, dimensions = $23, \
         weight = $24, updated_at = now() \
       WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    );
    sqlx::query_as::<_, Product>(&query)
      .bind(product.id)
      .bind(&product.name)
      .bind(&product.description)
      .bind(product.price_cents)
      .bind(&product.currency)
      .bind(product.discount_price_cents)
      .bind(product.count_in_stock)
      .bind(&product.sku)
      .bind(&product.category)
      .bind(product.brand.as_deref())
      .bind(product.collection.as_deref())
      .bind(product.material.as_deref())
      .bind(product.gender)
      .bind(&product.sizes)
      .bind(&product.colors)
      .bind(&product.images)
      .bind(product.is_featured)
      .bind(product.is_published)
      .bind(&product.tags)
      .bind(product.meta_title.as_deref())
      .bind(product.meta_description.as_deref())
      .bind(product.meta_keywords.as_deref())
      .bind(&product.dimensions)
      .bind(product.weight)
      .fetch_optional(exec)
      .await
  }

  pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
  }

  /// Takes `quantity` units out of stock. Returns `false` when stock is short
  /// or the product is gone; nothing changes in that case.
  #[instrument(name = "product_repo::decrement_stock", skip(exec), err(Display))]
  pub async fn decrement_stock<'e>(exec: impl PgExecutor<'e>, id: Uuid, quantity: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
      "UPDATE products SET count_in_stock = count_in_stock - $2, updated_at = now() \
       WHERE id = $1 AND count_in_stock >= $2",
    )
    .bind(id)
    .bind(quantity)
    .execute(exec)
    .await?;
    Ok(result.rows_affected() == 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sql(filter: ProductFilter) -> String {
    filter.to_query().unwrap().sql().to_string()
  }

  #[test]
  fn default_listing_is_published_newest_first() {
    let q = sql(ProductFilter::default());
    assert!(q.contains("WHERE is_published = TRUE"));
    assert!(q.contains("ORDER BY created_at DESC"));
    assert!(q.ends_with("LIMIT $1"));
  }

  #[test]
  fn category_all_disables_the_filter() {
    let q = sql(ProductFilter {
      category: Some("All".into()),
      ..Default::default()
    });
    assert!(!q.contains("category ="));
  }

  #[test]
  fn list_filters_bind_in_order() {
    let q = sql(ProductFilter {
      size: Some("S, M".into()),
      brand: Some("Acme".into()),
      min_price: Some(10.0),
      search: Some("tee".into()),
      sort_by: Some("priceDesc".into()),
      ..Default::default()
    });
    assert!(q.contains("brand = ANY($1)"));
    assert!(q.contains("sizes && $2"));
    assert!(q.contains("price_cents >= $3"));
    assert!(q.contains("(name ILIKE $4 OR description ILIKE $5)"));
    assert!(q.contains("ORDER BY price_cents DESC"));
    assert!(q.contains("LIMIT $6"));
  }

  #[test]
  fn invalid_sort_and_gender_are_validation_errors() {
    let bad_sort = ProductFilter {
      sort_by: Some("random".into()),
      ..Default::default()
    };
    assert!(matches!(bad_sort.to_query(), Err(AppError::Validation(_))));

    let bad_gender = ProductFilter {
      gender: Some("Kids".into()),
      ..Default::default()
    };
    assert!(matches!(bad_gender.to_query(), Err(AppError::Validation(_))));

    let bad_price = ProductFilter {
      max_price: Some(-1.0),
      ..Default::default()
    };
    assert!(matches!(bad_price.to_query(), Err(AppError::Validation(_))));
  }

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(escape_like("plain"), "plain");
  }

  #[test]
  fn csv_drops_blank_entries() {
    assert_eq!(csv(&Some(" a, ,b,".into())), vec!["a", "b"]);
    assert!(csv(&None).is_empty());
  }
}
