// storefront/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;

use actix_cors::Cors;
use actix_web::http::{header, Method};

use crate::config::AppConfig;

pub use routes::configure_app_routes as configure_app;

/// CORS for the configured frontend origins. `*` allows any origin.
pub fn cors(config: &AppConfig) -> Cors {
  let mut cors = Cors::default()
    .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
    .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
    .supports_credentials()
    .max_age(3600);
  for origin in &config.allowed_origins {
    cors = if origin == "*" {
      cors.allow_any_origin()
    } else {
      cors.allowed_origin(origin)
    };
  }
  cors
}
