// storefront/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  #[default]
  Customer,
  Admin,
}

impl UserRole {
  pub fn as_str(self) -> &'static str {
    match self {
      UserRole::Customer => "customer",
      UserRole::Admin => "admin",
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: UserRole,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn sample_user(email: &str, role: UserRole) -> User {
    User {
      id: Uuid::new_v4(),
      name: "Ada".into(),
      email: email.into(),
      password_hash: "$argon2id$secret".into(),
      role,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn password_hash_is_never_serialized() {
    let user = sample_user("ada@example.com", UserRole::Admin);
    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("passwordHash").is_none());
    assert_eq!(value["role"], "admin");
    assert!(value.get("createdAt").is_some());
  }
}
