// storefront/tests/db_tests.rs

//! Storage-level guarantees checked against a real Postgres. Each test gets a
//! fresh database from `#[sqlx::test]` (needs `DATABASE_URL`), with the
//! crate's migrations applied.

mod common;

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use shopflow::{ContextData, RunOutcome};
use sqlx::PgPool;

use common::{add_to_cart, create_product, create_user, paid_checkout, state_with, test_config};
use storefront::db::{CartRepo, CheckoutRepo, OrderRepo, ProductRepo, ReviewRepo, UserRepo};
use storefront::models::CartOwner;
use storefront::pipelines::contexts::{FinalizeCheckoutCtxData, SignupCtxData};
use storefront::{AppError, AppState};

fn finalize_ctx(state: &AppState, user_id: uuid::Uuid, checkout_id: uuid::Uuid) -> ContextData<FinalizeCheckoutCtxData> {
  ContextData::new(FinalizeCheckoutCtxData::new(state.clone(), user_id, checkout_id))
}

async fn stock_of(pool: &PgPool, product_id: uuid::Uuid) -> i32 {
  ProductRepo::find_by_id(pool, product_id).await.unwrap().unwrap().count_in_stock
}

#[sqlx::test(migrations = "./migrations")]
async fn finalize_creates_one_order_and_takes_stock(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "buyer@example.com").await;
  let product = create_product(&pool, "TEE-1", 5).await;
  add_to_cart(&state, CartOwner::User(user.id), product.id, 2).await.unwrap();
  let checkout = paid_checkout(&state, user.id).await;

  let ctx = finalize_ctx(&state, user.id, checkout.id);
  assert_eq!(state.flows.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);
  {
    let data = ctx.read();
    let order = data.order.as_ref().unwrap();
    assert_eq!(order.order.checkout_id, Some(checkout.id));
    assert_eq!(order.order.total_price_cents, 5000);
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.order_items[0].quantity, 2);
    assert!(data.confirmation_email_sent);
  }

  assert_eq!(stock_of(&pool, product.id).await, 3);
  assert!(CartRepo::find_by_owner(&pool, &CartOwner::User(user.id)).await.unwrap().is_none());
  assert!(CheckoutRepo::find_for_user(&pool, checkout.id, user.id).await.unwrap().unwrap().is_finalized);

  let again = state.flows.run(finalize_ctx(&state, user.id, checkout.id)).await;
  assert!(matches!(again, Err(AppError::Conflict(_))));
  assert_eq!(OrderRepo::list_for_user(&pool, user.id).await.unwrap().len(), 1);
  assert_eq!(stock_of(&pool, product.id).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_finalize_yields_exactly_one_order(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "racer@example.com").await;
  let product = create_product(&pool, "TEE-RACE", 4).await;
  add_to_cart(&state, CartOwner::User(user.id), product.id, 3).await.unwrap();
  let checkout = paid_checkout(&state, user.id).await;

  let (a, b) = tokio::join!(
    state.flows.run(finalize_ctx(&state, user.id, checkout.id)),
    state.flows.run(finalize_ctx(&state, user.id, checkout.id)),
  );
  let results = [a, b];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  assert!(results.iter().any(|r| matches!(r, Err(AppError::Conflict(_)))));

  assert_eq!(OrderRepo::list_for_user(&pool, user.id).await.unwrap().len(), 1);
  assert_eq!(stock_of(&pool, product.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn stock_shortfall_rolls_back_the_whole_finalize(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "short@example.com").await;
  let product = create_product(&pool, "TEE-SHORT", 5).await;
  add_to_cart(&state, CartOwner::User(user.id), product.id, 3).await.unwrap();
  let checkout = paid_checkout(&state, user.id).await;

  // Someone else bought most of the stock after this checkout was priced.
  sqlx::query("UPDATE products SET count_in_stock = 1 WHERE id = $1")
    .bind(product.id)
    .execute(&pool)
    .await
    .unwrap();

  let result = state.flows.run(finalize_ctx(&state, user.id, checkout.id)).await;
  assert!(matches!(result, Err(AppError::Conflict(m)) if m.contains("Insufficient stock")));

  assert!(!CheckoutRepo::find_for_user(&pool, checkout.id, user.id).await.unwrap().unwrap().is_finalized);
  assert!(OrderRepo::list_for_user(&pool, user.id).await.unwrap().is_empty());
  assert_eq!(stock_of(&pool, product.id).await, 1);
  assert!(CartRepo::find_by_owner(&pool, &CartOwner::User(user.id)).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn another_users_checkout_is_not_found(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "owner@example.com").await;
  let other = create_user(&pool, "other@example.com").await;
  let product = create_product(&pool, "TEE-OWNER", 5).await;
  add_to_cart(&state, CartOwner::User(user.id), product.id, 1).await.unwrap();
  let checkout = paid_checkout(&state, user.id).await;

  let foreign = state.flows.run(finalize_ctx(&state, other.id, checkout.id)).await;
  assert!(matches!(foreign, Err(AppError::NotFound(_))));
  assert!(OrderRepo::list_for_user(&pool, user.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn decrement_stock_never_goes_negative(pool: PgPool) {
  let product = create_product(&pool, "TEE-STOCK", 2).await;

  assert!(!ProductRepo::decrement_stock(&pool, product.id, 3).await.unwrap());
  assert_eq!(stock_of(&pool, product.id).await, 2);

  assert!(ProductRepo::decrement_stock(&pool, product.id, 2).await.unwrap());
  assert_eq!(stock_of(&pool, product.id).await, 0);

  assert!(!ProductRepo::decrement_stock(&pool, product.id, 1).await.unwrap());
  assert_eq!(stock_of(&pool, product.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn guest_cart_merges_into_existing_user_cart(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "merge@example.com").await;
  let product = create_product(&pool, "TEE-MERGE", 10).await;
  let guest = CartOwner::Guest("guest-merge".into());
  add_to_cart(&state, guest, product.id, 1).await.unwrap();
  add_to_cart(&state, CartOwner::User(user.id), product.id, 2).await.unwrap();

  let mut tx = pool.begin().await.unwrap();
  let merged = CartRepo::merge_guest_into_user(&mut tx, "guest-merge", user.id).await.unwrap().unwrap();
  tx.commit().await.unwrap();

  assert_eq!(merged.user_id, Some(user.id));
  let items = CartRepo::items(&pool, merged.id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].quantity, 3);
  assert!(CartRepo::find_by_owner(&pool, &CartOwner::Guest("guest-merge".into())).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn guest_cart_is_adopted_when_user_has_none(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "adopt@example.com").await;
  let product = create_product(&pool, "TEE-ADOPT", 10).await;
  add_to_cart(&state, CartOwner::Guest("guest-adopt".into()), product.id, 2).await.unwrap();

  let mut conn = pool.acquire().await.unwrap();
  let adopted = CartRepo::merge_guest_into_user(&mut conn, "guest-adopt", user.id).await.unwrap().unwrap();
  assert_eq!(adopted.user_id, Some(user.id));
  assert!(adopted.guest_id.is_none());
  assert_eq!(CartRepo::items(&pool, adopted.id).await.unwrap()[0].quantity, 2);

  assert!(CartRepo::merge_guest_into_user(&mut conn, "guest-adopt", user.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn review_rating_is_a_running_mean_and_one_per_user(pool: PgPool) {
  let product = create_product(&pool, "TEE-REVIEW", 1).await;
  let first = create_user(&pool, "first@example.com").await;
  let second = create_user(&pool, "second@example.com").await;

  for (user, rating) in [(&first, 2), (&second, 3)] {
    let mut tx = pool.begin().await.unwrap();
    ReviewRepo::create(&mut tx, product.id, user.id, &user.name, rating, "ok").await.unwrap();
    tx.commit().await.unwrap();
  }

  let reviewed = ProductRepo::find_by_id(&pool, product.id).await.unwrap().unwrap();
  assert_eq!(reviewed.num_reviews, 2);
  assert!((reviewed.rating - 2.5).abs() < 1e-9);

  let mut tx = pool.begin().await.unwrap();
  let dup = ReviewRepo::create(&mut tx, product.id, first.id, &first.name, 5, "again").await;
  assert!(matches!(AppError::from(dup.unwrap_err()).classify(), AppError::Conflict(_)));
  drop(tx);

  assert_eq!(ProductRepo::find_by_id(&pool, product.id).await.unwrap().unwrap().num_reviews, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_sku_is_a_conflict(pool: PgPool) {
  let product = create_product(&pool, "TEE-DUP", 1).await;
  let input = serde_json::from_value(serde_json::json!({
    "name": "Another tee",
    "priceCents": 1000,
    "sku": product.sku,
    "category": "Top Wear",
  }))
  .unwrap();

  let err = ProductRepo::create(&pool, &input, None).await.unwrap_err();
  assert_eq!(AppError::from(err).status_code(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_survives_an_undeliverable_welcome_email(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let ctx = ContextData::new(SignupCtxData::new(
    state.clone(),
    "Ada".into(),
    "Ada@Example.invalid".into(),
    "correct-horse-1".into(),
  ));

  assert_eq!(state.flows.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);
  {
    let data = ctx.read();
    assert!(data.created_user.is_some());
    assert!(data.token.is_some());
    assert!(!data.welcome_email_sent);
  }
  assert!(UserRepo::find_by_email(&pool, "ada@example.invalid").await.unwrap().is_some());

  let again = ContextData::new(SignupCtxData::new(
    state.clone(),
    "Ada".into(),
    "ada@example.invalid".into(),
    "correct-horse-1".into(),
  ));
  assert!(matches!(state.flows.run(again).await, Err(AppError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn finalize_survives_an_undeliverable_confirmation_email(pool: PgPool) {
  let state = state_with(pool.clone(), test_config());
  let user = create_user(&pool, "buyer@example.invalid").await;
  let product = create_product(&pool, "TEE-MAIL", 3).await;
  add_to_cart(&state, CartOwner::User(user.id), product.id, 1).await.unwrap();
  let checkout = paid_checkout(&state, user.id).await;

  let ctx = finalize_ctx(&state, user.id, checkout.id);
  assert_eq!(state.flows.run(ctx.clone()).await.unwrap(), RunOutcome::Completed);
  let data = ctx.read();
  assert!(data.order.is_some());
  assert!(!data.confirmation_email_sent);
  assert_eq!(OrderRepo::list_for_user(&pool, user.id).await.unwrap().len(), 1);
}
