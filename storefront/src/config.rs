// storefront/src/config.rs

use crate::errors::{AppError, Result};
use actix_web::http::Uri;
use dotenvy::dotenv;
use std::path::PathBuf;

const DEFAULT_JWT_EXPIRY_HOURS: i64 = 720;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_max_connections: u32,
  pub app_base_url: String,

  pub jwt_secret: String,
  pub jwt_expiry_hours: i64,

  pub upload_dir: PathBuf,
  pub max_upload_bytes: usize,
  pub allowed_origins: Vec<String>,

  pub mock_email_sender: String,

  pub seed_db: bool,
  pub seed_admin_email: Option<String>,
  pub seed_admin_password: Option<String>,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds the config from an arbitrary key lookup. Empty values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let require = |key: &str| {
      get(key).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", key)))
    };

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port: u16 = parse_or(get("SERVER_PORT"), "SERVER_PORT", 8080)?;
    let database_url = require("DATABASE_URL")?;
    let db_max_connections: u32 = parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
    let app_base_url = get("APP_BASE_URL")
      .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();

    let jwt_secret = require("JWT_SECRET")?;
    let jwt_expiry_hours: i64 = parse_or(get("JWT_EXPIRY_HOURS"), "JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS)?;
    if jwt_expiry_hours <= 0 {
      return Err(AppError::Config("JWT_EXPIRY_HOURS must be positive".to_string()));
    }

    let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()));
    let max_upload_bytes: usize = parse_or(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
    let allowed_origins = parse_origins(&get("ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string()))?;

    let mock_email_sender = get("MOCK_EMAIL_SENDER").unwrap_or_else(|| "noreply@example.com".to_string());

    let seed_db: bool = parse_or(get("SEED_DB"), "SEED_DB", false)?;
    let seed_admin_email = get("SEED_ADMIN_EMAIL");
    let seed_admin_password = get("SEED_ADMIN_PASSWORD");

    let log_format = match get("LOG_FORMAT").as_deref() {
      None | Some("pretty") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT value: {}", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      app_base_url,
      jwt_secret,
      jwt_expiry_hours,
      upload_dir,
      max_upload_bytes,
      allowed_origins,
      mock_email_sender,
      seed_db,
      seed_admin_email,
      seed_admin_password,
      log_format,
    })
  }
}

/// Comma-separated CORS origins. Each entry is `*` or a bare `scheme://host[:port]`.
fn parse_origins(raw: &str) -> Result<Vec<String>> {
  raw
    .split(',')
    .map(|o| o.trim().trim_end_matches('/'))
    .filter(|o| !o.is_empty())
    .map(|origin| {
      if origin == "*" {
        return Ok(origin.to_string());
      }
      let invalid = || AppError::Config(format!("Invalid ALLOWED_ORIGINS entry '{}'", origin));
      let uri: Uri = origin.parse().map_err(|_| invalid())?;
      let scheme_ok = matches!(uri.scheme_str(), Some("http" | "https"));
      let bare = matches!(uri.path(), "" | "/") && uri.query().is_none();
      if !scheme_ok || uri.authority().is_none() || !bare {
        return Err(invalid());
      }
      Ok(origin.to_string())
    })
    .collect()
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(v) => v
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", key, v, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k| map.get(k).cloned()
  }

  const REQUIRED: [(&str, &str); 2] = [("DATABASE_URL", "postgres://localhost/shop"), ("JWT_SECRET", "s3cret")];

  #[test]
  fn defaults_apply_when_only_required_keys_are_set() {
    let cfg = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
    assert_eq!(cfg.server_host, "127.0.0.1");
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.app_base_url, "http://127.0.0.1:8080");
    assert_eq!(cfg.jwt_expiry_hours, 720);
    assert_eq!(cfg.max_upload_bytes, 5 * 1024 * 1024);
    assert_eq!(cfg.allowed_origins, vec!["http://localhost:3000"]);
    assert_eq!(cfg.upload_dir, PathBuf::from("./uploads"));
    assert!(!cfg.seed_db);
    assert_eq!(cfg.log_format, LogFormat::Pretty);
  }

  #[test]
  fn missing_secret_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("JWT_SECRET")));
  }

  #[test]
  fn invalid_numbers_are_rejected() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("SERVER_PORT", "eighty"));
    assert!(matches!(AppConfig::from_lookup(lookup(&pairs)), Err(AppError::Config(_))));

    let mut pairs = REQUIRED.to_vec();
    pairs.push(("JWT_EXPIRY_HOURS", "0"));
    assert!(matches!(AppConfig::from_lookup(lookup(&pairs)), Err(AppError::Config(_))));
  }

  #[test]
  fn origins_are_split_and_trimmed() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("ALLOWED_ORIGINS", "https://shop.example/, http://localhost:5173 ,,"));
    pairs.push(("LOG_FORMAT", "json"));
    let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
    assert_eq!(cfg.allowed_origins, vec!["https://shop.example", "http://localhost:5173"]);
    assert_eq!(cfg.log_format, LogFormat::Json);
  }

  #[test]
  fn malformed_origins_are_config_errors() {
    for bad in ["localhost:3000", "ftp://files.example", "https://shop.example/app", "not a url", "https://"] {
      let mut pairs = REQUIRED.to_vec();
      pairs.push(("ALLOWED_ORIGINS", bad));
      assert!(
        matches!(AppConfig::from_lookup(lookup(&pairs)), Err(AppError::Config(m)) if m.contains("ALLOWED_ORIGINS")),
        "{}",
        bad
      );
    }

    let mut pairs = REQUIRED.to_vec();
    pairs.push(("ALLOWED_ORIGINS", "*, http://127.0.0.1:8080"));
    let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
    assert_eq!(cfg.allowed_origins, vec!["*", "http://127.0.0.1:8080"]);
  }
}
