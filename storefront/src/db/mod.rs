// storefront/src/db/mod.rs

//! sqlx repositories, one per table family. Functions take any
//! `PgExecutor` so they run the same against the pool or inside a transaction.

pub mod cart_repo;
pub mod checkout_repo;
pub mod order_repo;
pub mod product_repo;
pub mod review_repo;
pub mod subscriber_repo;
pub mod user_repo;

pub use cart_repo::CartRepo;
pub use checkout_repo::CheckoutRepo;
pub use order_repo::OrderRepo;
pub use product_repo::{ProductFilter, ProductRepo};
pub use review_repo::ReviewRepo;
pub use subscriber_repo::SubscriberRepo;
pub use user_repo::UserRepo;
