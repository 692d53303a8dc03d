// storefront/src/db/user_repo.rs

use crate::models::{User, UserRole};
use sqlx::PgExecutor;
use tracing::instrument;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
  #[instrument(name = "user_repo::create", skip(exec, password_hash), err(Display))]
  pub async fn create<'e>(
    exec: impl PgExecutor<'e>,
    name: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
  ) -> Result<User, sqlx::Error> {
    let query = format!(
      "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
      .bind(Uuid::new_v4())
      .bind(name)
      .bind(email)
      .bind(password_hash)
      .bind(role)
      .fetch_one(exec)
      .await
  }

  pub async fn find_by_id<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query).bind(id).fetch_optional(exec).await
  }

  pub async fn find_by_email<'e>(exec: impl PgExecutor<'e>, email: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    sqlx::query_as::<_, User>(&query).bind(email).fetch_optional(exec).await
  }

  pub async fn email_exists<'e>(exec: impl PgExecutor<'e>, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
      .bind(email)
      .fetch_one(exec)
      .await
  }

  pub async fn list<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
    sqlx::query_as::<_, User>(&query).fetch_all(exec).await
  }

  /// Updates the given fields; `None` keeps the stored value.
  #[instrument(name = "user_repo::update", skip(exec), err(Display))]
  pub async fn update<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    role: Option<UserRole>,
  ) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
      "UPDATE users SET \
         name = COALESCE($2, name), \
         email = COALESCE($3, email), \
         role = COALESCE($4, role), \
         updated_at = now() \
       WHERE id = $1 RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, User>(&query)
      .bind(id)
      .bind(name)
      .bind(email)
      .bind(role)
      .fetch_optional(exec)
      .await
  }

  pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
  }
}
