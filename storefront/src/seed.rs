// storefront/src/seed.rs

//! Optional startup seeding: an admin account and a small sample catalog.

use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::ProductRepo;
use crate::errors::{AppError, Result};
use crate::models::{normalize_email, NewProduct, UserRole};
use crate::services::auth_service;

fn sample_catalog() -> Result<Vec<NewProduct>> {
  let raw = json!([
    {
      "name": "Classic Oxford Button-Down Shirt",
      "description": "A timeless button-down in breathable cotton oxford.",
      "priceCents": 3999,
      "discountPriceCents": 3499,
      "countInStock": 20,
      "sku": "OX-SH-001",
      "category": "Top Wear",
      "brand": "Urban Threads",
      "collection": "Business Casual",
      "material": "Cotton",
      "gender": "Men",
      "sizes": ["S", "M", "L", "XL"],
      "colors": ["White", "Blue"],
      "images": [{ "url": "https://picsum.photos/seed/oxford/500/500", "altText": "Oxford shirt" }],
      "isFeatured": true,
      "isPublished": true,
      "tags": ["shirt", "cotton"]
    },
    {
      "name": "Slim-Fit Stretch Chinos",
      "description": "Everyday chinos with a touch of stretch.",
      "priceCents": 5500,
      "countInStock": 15,
      "sku": "CH-PT-002",
      "category": "Bottom Wear",
      "brand": "Modern Fit",
      "collection": "Everyday Essentials",
      "material": "Cotton Blend",
      "gender": "Men",
      "sizes": ["30", "32", "34"],
      "colors": ["Khaki", "Navy"],
      "images": [{ "url": "https://picsum.photos/seed/chinos/500/500", "altText": "Chinos" }],
      "isPublished": true
    },
    {
      "name": "Relaxed Knit Cardigan",
      "description": "Soft oversized cardigan for cool evenings.",
      "priceCents": 6200,
      "countInStock": 8,
      "sku": "KN-CD-003",
      "category": "Top Wear",
      "brand": "ChicWear",
      "collection": "Winter Essentials",
      "material": "Wool",
      "gender": "Women",
      "sizes": ["S", "M", "L"],
      "colors": ["Beige", "Grey"],
      "images": [{ "url": "https://picsum.photos/seed/cardigan/500/500", "altText": "Cardigan" }],
      "isPublished": true
    },
    {
      "name": "Canvas Tote Bag",
      "description": "Sturdy tote with an inner pocket.",
      "priceCents": 1800,
      "countInStock": 40,
      "sku": "AC-TB-004",
      "category": "Accessories",
      "brand": "Street Style",
      "material": "Canvas",
      "gender": "Unisex",
      "images": [{ "url": "https://picsum.photos/seed/tote/500/500", "altText": "Tote bag" }],
      "isPublished": true
    }
  ]);
  let products: Vec<NewProduct> =
    serde_json::from_value(raw).map_err(|e| AppError::Internal(format!("Invalid seed catalog: {}", e)))?;
  products.into_iter().map(NewProduct::validated).collect()
}

/// Creates or promotes the configured admin. Returns its id.
async fn upsert_admin(pool: &PgPool, email: &str, password: &str) -> Result<Uuid> {
  auth_service::validate_password_policy(password)?;
  let password_hash = auth_service::hash_password(password)?;
  let id: Uuid = sqlx::query_scalar(
    "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, 'Admin', $2, $3, $4) \
     ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, updated_at = now() \
     RETURNING id",
  )
  .bind(Uuid::new_v4())
  .bind(email)
  .bind(password_hash)
  .bind(UserRole::Admin)
  .fetch_one(pool)
  .await?;
  Ok(id)
}

#[instrument(name = "seed::seed_database", skip_all, err(Display))]
pub async fn seed_database(pool: &PgPool, config: &AppConfig) -> Result<()> {
  let admin_id = match (&config.seed_admin_email, &config.seed_admin_password) {
    (Some(email), Some(password)) => {
      let id = upsert_admin(pool, &normalize_email(email), password).await?;
      info!(admin_id = %id, "Seed admin ready.");
      Some(id)
    }
    (None, None) => None,
    _ => {
      warn!("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together; skipping admin seed.");
      None
    }
  };

  let mut created = 0usize;
  for product in sample_catalog()? {
    match ProductRepo::create(pool, &product, admin_id).await.map_err(|e| AppError::from(e).classify()) {
      Ok(_) => created += 1,
      Err(AppError::Conflict(_)) => debug!(sku = %product.sku, "Seed product already present."),
      Err(e) => return Err(e),
    }
  }
  info!(created, "Sample catalog seeded.");
  Ok(())
}
