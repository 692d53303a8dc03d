// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  admin_handlers, cart_handlers, checkout_handlers, order_handlers, product_handlers, subscribe_handlers, upload_handlers,
  user_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies, query strings and paths become JSON errors like every other failure.
fn extractor_configs() -> (web::JsonConfig, web::QueryConfig, web::PathConfig) {
  let json = web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into());
  let query = web::QueryConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into());
  let path = web::PathConfig::default().error_handler(|err, _req| AppError::NotFound(err.to_string()).into());
  (json, query, path)
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  let (json_cfg, query_cfg, path_cfg) = extractor_configs();

  cfg
    .app_data(json_cfg)
    .app_data(query_cfg)
    .app_data(path_cfg)
    .route(
      "/uploads/{file_name}",
      web::get().to(upload_handlers::serve_upload_handler),
    )
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/users")
            .route("/register", web::post().to(user_handlers::register_handler))
            .route("/login", web::post().to(user_handlers::login_handler))
            .route("/profile", web::get().to(user_handlers::profile_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            // Fixed segments must be registered before `/{id}`.
            .route("/best-seller", web::get().to(product_handlers::best_seller_handler))
            .route("/new-arrivals", web::get().to(product_handlers::new_arrivals_handler))
            .route("/similar/{id}", web::get().to(product_handlers::similar_products_handler))
            .route("/{id}", web::get().to(product_handlers::get_product_handler))
            .route("/{id}", web::put().to(product_handlers::update_product_handler))
            .route("/{id}", web::delete().to(product_handlers::delete_product_handler))
            .route("/{id}/reviews", web::get().to(product_handlers::list_reviews_handler))
            .route("/{id}/reviews", web::post().to(product_handlers::create_review_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("", web::put().to(cart_handlers::update_cart_handler))
            .route("", web::delete().to(cart_handlers::remove_from_cart_handler))
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("/merge", web::post().to(cart_handlers::merge_cart_handler)),
        )
        .service(
          web::scope("/checkout")
            .route("", web::post().to(checkout_handlers::create_checkout_handler))
            .route("/{id}/pay", web::put().to(checkout_handlers::pay_checkout_handler))
            .route("/{id}/finalize", web::post().to(checkout_handlers::finalize_checkout_handler)),
        )
        .service(
          web::scope("/orders")
            .route("/my-orders", web::get().to(order_handlers::my_orders_handler))
            .route("/{id}", web::get().to(order_handlers::get_order_handler)),
        )
        .service(
          web::resource("/upload").route(web::post().to(upload_handlers::upload_image_handler)),
        )
        .route("/subscribe", web::post().to(subscribe_handlers::subscribe_handler))
        .service(
          web::scope("/admin")
            .route("/users", web::get().to(admin_handlers::list_users_handler))
            .route("/users", web::post().to(admin_handlers::create_user_handler))
            .route("/users/{id}", web::put().to(admin_handlers::update_user_handler))
            .route("/users/{id}", web::delete().to(admin_handlers::delete_user_handler))
            .route("/products", web::get().to(admin_handlers::list_products_handler))
            .route("/orders", web::get().to(admin_handlers::list_orders_handler))
            .route("/orders/{id}", web::put().to(admin_handlers::update_order_handler))
            .route("/orders/{id}", web::delete().to(admin_handlers::delete_order_handler)),
        ),
    );
}
