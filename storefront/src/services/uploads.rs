// storefront/src/services/uploads.rs

//! Local image storage standing in for the CDN.

use crate::errors::{AppError, Result as AppResult};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use uuid::Uuid;

const IMAGE_TYPES: [(&str, &str); 4] = [
  ("image/jpeg", "jpg"),
  ("image/png", "png"),
  ("image/webp", "webp"),
  ("image/gif", "gif"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
  let essence = content_type.split(';').next().unwrap_or_default().trim();
  IMAGE_TYPES
    .iter()
    .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
    .map(|(_, ext)| *ext)
}

pub fn content_type_for(extension: &str) -> Option<&'static str> {
  IMAGE_TYPES
    .iter()
    .find(|(_, ext)| *ext == extension)
    .map(|(mime, _)| *mime)
}

/// Accepts only names this service generates (`<uuid>.<known ext>`); returns the
/// content type to serve it with.
pub fn parse_stored_name(file_name: &str) -> Option<&'static str> {
  let (stem, ext) = file_name.rsplit_once('.')?;
  Uuid::parse_str(stem).ok()?;
  content_type_for(ext)
}

/// Writes `bytes` under `dir` with a fresh name and returns that name.
#[instrument(name = "uploads::store_image", skip(dir, bytes), fields(size = bytes.len()), err(Display))]
pub async fn store_image(dir: &Path, content_type: &str, bytes: &[u8]) -> AppResult<String> {
  let ext = extension_for(content_type).ok_or_else(|| {
    AppError::Validation(format!(
      "Unsupported content type '{}': expected a JPEG, PNG, WebP or GIF image.",
      content_type
    ))
  })?;
  if bytes.is_empty() {
    return Err(AppError::Validation("Upload body is empty.".to_string()));
  }

  let file_name = format!("{}.{}", Uuid::new_v4(), ext);
  tokio::fs::create_dir_all(dir).await?;
  tokio::fs::write(dir.join(&file_name), bytes).await?;
  info!(%file_name, "Image stored.");
  Ok(file_name)
}

pub fn stored_path(dir: &Path, file_name: &str) -> PathBuf {
  dir.join(file_name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_types_map_to_extensions() {
    assert_eq!(extension_for("image/png"), Some("png"));
    assert_eq!(extension_for("IMAGE/JPEG; charset=binary"), Some("jpg"));
    assert_eq!(extension_for("application/pdf"), None);
  }

  #[test]
  fn only_generated_names_are_served() {
    let name = format!("{}.webp", Uuid::new_v4());
    assert_eq!(parse_stored_name(&name), Some("image/webp"));
    assert_eq!(parse_stored_name("../etc/passwd"), None);
    assert_eq!(parse_stored_name("photo.png"), None);
    assert_eq!(parse_stored_name(&format!("{}.exe", Uuid::new_v4())), None);
  }

  #[tokio::test]
  async fn stores_under_fresh_name() {
    let dir = std::env::temp_dir().join(format!("storefront-test-{}", Uuid::new_v4()));
    let name = store_image(&dir, "image/gif", b"GIF89a").await.unwrap();
    assert!(parse_stored_name(&name).is_some());
    assert_eq!(tokio::fs::read(stored_path(&dir, &name)).await.unwrap(), b"GIF89a");
    tokio::fs::remove_dir_all(&dir).await.ok();

    assert!(matches!(
      store_image(&dir, "text/plain", b"x").await,
      Err(AppError::Validation(_))
    ));
  }
}
