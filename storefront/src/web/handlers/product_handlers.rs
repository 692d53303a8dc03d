// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{ProductFilter, ProductRepo, ReviewRepo, UserRepo};
use crate::errors::AppError;
use crate::models::{NewProduct, NewReview, Product, ProductPatch};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser, OptionalUser};

fn not_found() -> AppError {
  AppError::NotFound("Product not found.".to_string())
}

#[instrument(name = "handler::list_products", skip(app_state), err(Display))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  filter: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let products = ProductRepo::list(&app_state.db_pool, &filter).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::best_seller", skip(app_state), err(Display))]
pub async fn best_seller_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let product = ProductRepo::best_seller(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No best seller found.".to_string()))?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::new_arrivals", skip(app_state), err(Display))]
pub async fn new_arrivals_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(ProductRepo::new_arrivals(&app_state.db_pool).await?))
}

/// Unpublished products exist only for admins.
fn visible_to(product: Product, viewer: &OptionalUser) -> Result<Product, AppError> {
  let is_admin = viewer.0.as_ref().is_some_and(AuthenticatedUser::is_admin);
  if product.is_published || is_admin {
    Ok(product)
  } else {
    Err(not_found())
  }
}

#[instrument(name = "handler::get_product", skip(app_state, viewer), err(Display))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  viewer: OptionalUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = ProductRepo::find_by_id(&app_state.db_pool, path.into_inner())
    .await?
    .ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(visible_to(product, &viewer)?))
}

#[instrument(name = "handler::similar_products", skip(app_state), err(Display))]
pub async fn similar_products_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = ProductRepo::find_by_id(&app_state.db_pool, path.into_inner())
    .await?
    .ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(ProductRepo::similar(&app_state.db_pool, &product).await?))
}

#[instrument(name = "handler::create_product", skip(app_state, admin, payload), fields(admin_id = %admin.0.user_id), err(Display))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let input = payload.into_inner().validated()?;
  let product = ProductRepo::create(&app_state.db_pool, &input, Some(admin.0.user_id))
    .await
    .map_err(|e| AppError::from(e).classify())?;
  info!(product_id = %product.id, sku = %product.sku, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, _admin, payload), err(Display))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let mut product = ProductRepo::find_by_id(&app_state.db_pool, id).await?.ok_or_else(not_found)?;
  payload.into_inner().apply(&mut product)?;
  let updated = ProductRepo::update(&app_state.db_pool, &product)
    .await
    .map_err(|e| AppError::from(e).classify())?
    .ok_or_else(not_found)?;
  info!(product_id = %id, "Product updated.");
  Ok(HttpResponse::Ok().json(updated))
}

#[instrument(name = "handler::delete_product", skip(app_state, _admin), err(Display))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if !ProductRepo::delete(&app_state.db_pool, id).await? {
    return Err(not_found());
  }
  info!(product_id = %id, "Product deleted.");
  Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Product removed." })))
}

#[instrument(name = "handler::list_reviews", skip(app_state), err(Display))]
pub async fn list_reviews_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(ReviewRepo::list_for_product(&app_state.db_pool, path.into_inner()).await?))
}

#[instrument(name = "handler::create_review", skip(app_state, auth, payload), fields(user_id = %auth.user_id), err(Display))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let review = payload.into_inner().validated()?;

  ProductRepo::find_by_id(&app_state.db_pool, product_id)
    .await?
    .filter(|p| p.is_published)
    .ok_or_else(not_found)?;
  let user = UserRepo::find_by_id(&app_state.db_pool, auth.user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

  let mut tx = app_state.db_pool.begin().await?;
  let created = ReviewRepo::create(&mut tx, product_id, user.id, &user.name, review.rating, &review.comment)
    .await
    .map_err(|e| match AppError::from(e).classify() {
      AppError::Conflict(_) => {
        warn!(%product_id, "Duplicate review rejected.");
        AppError::Validation("Product already reviewed.".to_string())
      }
      other => other,
    })?;
  tx.commit().await?;

  info!(review_id = %created.id, %product_id, "Review added.");
  Ok(HttpResponse::Created().json(created))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::product::tests::sample_product;
  use crate::models::UserRole;

  fn viewer(role: Option<UserRole>) -> OptionalUser {
    OptionalUser(role.map(|role| AuthenticatedUser { user_id: Uuid::new_v4(), role }))
  }

  #[test]
  fn drafts_are_hidden_from_everyone_but_admins() {
    let mut draft = sample_product();
    draft.is_published = false;

    assert!(matches!(visible_to(draft.clone(), &viewer(None)), Err(AppError::NotFound(_))));
    assert!(matches!(visible_to(draft.clone(), &viewer(Some(UserRole::Customer))), Err(AppError::NotFound(_))));
    assert_eq!(visible_to(draft.clone(), &viewer(Some(UserRole::Admin))).unwrap().id, draft.id);
  }

  #[test]
  fn published_products_are_visible_to_guests() {
    let product = sample_product();
    assert_eq!(visible_to(product.clone(), &viewer(None)).unwrap().id, product.id);
  }
}
