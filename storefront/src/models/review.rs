// storefront/src/models/review.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub name: String,
  pub rating: i32,
  pub comment: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
  pub rating: i32,
  #[serde(default)]
  pub comment: String,
}

impl NewReview {
  pub fn validated(self) -> Result<Self> {
    if !(1..=5).contains(&self.rating) {
      return Err(AppError::Validation("Rating must be between 1 and 5.".to_string()));
    }
    Ok(Self {
      rating: self.rating,
      comment: self.comment.trim().to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rating_bounds() {
    for r in [0, 6, -1] {
      let review = NewReview {
        rating: r,
        comment: String::new(),
      };
      assert!(review.validated().is_err());
    }
    let ok = NewReview {
      rating: 5,
      comment: " great ".into(),
    }
    .validated()
    .unwrap();
    assert_eq!(ok.comment, "great");
  }
}
