// storefront/src/db/cart_repo.rs

use crate::models::{Cart, CartItem, CartOwner, CartView, Product};
use sqlx::{PgConnection, PgExecutor};
use tracing::{debug, instrument};
use uuid::Uuid;

const CART_COLUMNS: &str = "id, user_id, guest_id, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, name, image, price_cents, size, color, quantity";

pub struct CartRepo;

impl CartRepo {
  pub async fn find_by_owner<'e>(exec: impl PgExecutor<'e>, owner: &CartOwner) -> Result<Option<Cart>, sqlx::Error> {
    let column = match owner {
      CartOwner::User(_) => "user_id",
      CartOwner::Guest(_) => "guest_id",
    };
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE {column} = $1");
    let q = sqlx::query_as::<_, Cart>(&query);
    let q = match owner {
      CartOwner::User(id) => q.bind(*id),
      CartOwner::Guest(id) => q.bind(id.as_str()),
    };
    q.fetch_optional(exec).await
  }

  /// Returns the owner's cart, creating an empty one first if needed.
  #[instrument(name = "cart_repo::find_or_create", skip(conn), fields(owner = %owner), err(Display))]
  pub async fn find_or_create(conn: &mut PgConnection, owner: &CartOwner) -> Result<Cart, sqlx::Error> {
    let insert = match owner {
      CartOwner::User(_) => "INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
      CartOwner::Guest(_) => "INSERT INTO carts (id, guest_id) VALUES ($1, $2) ON CONFLICT (guest_id) DO NOTHING",
    };
    let q = sqlx::query(insert).bind(Uuid::new_v4());
    let inserted = match owner {
      CartOwner::User(id) => q.bind(*id),
      CartOwner::Guest(id) => q.bind(id.clone()),
    }
    .execute(&mut *conn)
    .await?
    .rows_affected();
    debug!(created = inserted == 1, "Cart resolved.");

    Self::find_by_owner(&mut *conn, owner)
      .await?
      .ok_or(sqlx::Error::RowNotFound)
  }

  pub async fn items<'e>(exec: impl PgExecutor<'e>, cart_id: Uuid) -> Result<Vec<CartItem>, sqlx::Error> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY name, size, color");
    sqlx::query_as::<_, CartItem>(&query).bind(cart_id).fetch_all(exec).await
  }

  /// Loads the owner's cart with its lines, if it exists.
  pub async fn view(conn: &mut PgConnection, owner: &CartOwner) -> Result<Option<CartView>, sqlx::Error> {
    let Some(cart) = Self::find_by_owner(&mut *conn, owner).await? else {
      return Ok(None);
    };
    let items = Self::items(&mut *conn, cart.id).await?;
    Ok(Some(CartView::new(cart, items)))
  }

  /// Units of `product_id` already in the cart across all size/color lines.
  pub async fn quantity_of_product<'e>(exec: impl PgExecutor<'e>, cart_id: Uuid, product_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE cart_id = $1 AND product_id = $2")
      .bind(cart_id)
      .bind(product_id)
      .fetch_one(exec)
      .await
  }

  /// Adds `quantity` to the (product, size, color) line, creating it if absent.
  /// The unit price snapshot is refreshed from `product`.
  #[instrument(name = "cart_repo::add_item", skip(exec, product), fields(product_id = %product.id), err(Display))]
  pub async fn add_item<'e>(
    exec: impl PgExecutor<'e>,
    cart_id: Uuid,
    product: &Product,
    size: &str,
    color: &str,
    quantity: i32,
  ) -> Result<CartItem, sqlx::Error> {
    let query = format!(
      "INSERT INTO cart_items (id, cart_id, product_id, name, image, price_cents, size, color, quantity) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
       ON CONFLICT (cart_id, product_id, size, color) DO UPDATE SET \
         quantity = cart_items.quantity + EXCLUDED.quantity, \
         price_cents = EXCLUDED.price_cents, \
         name = EXCLUDED.name, \
         image = EXCLUDED.image \
       RETURNING {ITEM_COLUMNS}"
    );
    sqlx::query_as::<_, CartItem>(&query)
      .bind(Uuid::new_v4())
      .bind(cart_id)
      .bind(product.id)
      .bind(&product.name)
      .bind(product.primary_image_url())
      .bind(product.effective_price_cents())
      .bind(size)
      .bind(color)
      .bind(quantity)
      .fetch_one(exec)
      .await
  }

  pub async fn set_quantity<'e>(
    exec: impl PgExecutor<'e>,
    cart_id: Uuid,
    product_id: Uuid,
    size: &str,
    color: &str,
    quantity: i32,
  ) -> Result<Option<CartItem>, sqlx::Error> {
    let query = format!(
      "UPDATE cart_items SET quantity = $5 \
       WHERE cart_id = $1 AND product_id = $2 AND size = $3 AND color = $4 \
       RETURNING {ITEM_COLUMNS}"
    );
    sqlx::query_as::<_, CartItem>(&query)
      .bind(cart_id)
      .bind(product_id)
      .bind(size)
      .bind(color)
      .bind(quantity)
      .fetch_optional(exec)
      .await
  }

  pub async fn remove_item<'e>(
    exec: impl PgExecutor<'e>,
    cart_id: Uuid,
    product_id: Uuid,
    size: &str,
    color: &str,
  ) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2 AND size = $3 AND color = $4")
      .bind(cart_id)
      .bind(product_id)
      .bind(size)
      .bind(color)
      .execute(exec)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  pub async fn touch<'e>(exec: impl PgExecutor<'e>, cart_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
      .bind(cart_id)
      .execute(exec)
      .await?;
    Ok(())
  }

  pub async fn delete_for_user<'e>(exec: impl PgExecutor<'e>, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
  }

  /// Folds the guest cart into the user's cart, or hands it over when the user
  /// has none. The guest cart no longer exists afterwards. Returns `None` when
  /// there is no guest cart. Run inside a transaction.
  #[instrument(name = "cart_repo::merge_guest_into_user", skip(conn), err(Display))]
  pub async fn merge_guest_into_user(conn: &mut PgConnection, guest_id: &str, user_id: Uuid) -> Result<Option<Cart>, sqlx::Error> {
    let query = format!("SELECT {CART_COLUMNS} FROM carts WHERE guest_id = $1 FOR UPDATE");
    let Some(guest_cart) = sqlx::query_as::<_, Cart>(&query)
      .bind(guest_id)
      .fetch_optional(&mut *conn)
      .await?
    else {
      return Ok(None);
    };

    let user_owner = CartOwner::User(user_id);
    let Some(user_cart) = Self::find_by_owner(&mut *conn, &user_owner).await? else {
      let query = format!(
        "UPDATE carts SET user_id = $2, guest_id = NULL, updated_at = now() WHERE id = $1 RETURNING {CART_COLUMNS}"
      );
      let adopted = sqlx::query_as::<_, Cart>(&query)
        .bind(guest_cart.id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
      debug!(cart_id = %adopted.id, "Guest cart adopted by user.");
      return Ok(Some(adopted));
    };

    sqlx::query(
      "INSERT INTO cart_items (id, cart_id, product_id, name, image, price_cents, size, color, quantity) \
       SELECT gen_random_uuid(), $2, product_id, name, image, price_cents, size, color, quantity \
       FROM cart_items WHERE cart_id = $1 \
       ON CONFLICT (cart_id, product_id, size, color) DO UPDATE SET \
         quantity = cart_items.quantity + EXCLUDED.quantity",
    )
    .bind(guest_cart.id)
    .bind(user_cart.id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(guest_cart.id)
      .execute(&mut *conn)
      .await?;
    Self::touch(&mut *conn, user_cart.id).await?;
    debug!(cart_id = %user_cart.id, "Guest cart merged into user cart.");
    Ok(Some(user_cart))
  }
}
