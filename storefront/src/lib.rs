// storefront/src/lib.rs

//! Storefront REST backend: catalog, cart, checkout, orders and admin
//! management over PostgreSQL.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod seed;
pub mod services;
pub mod state;
pub mod web;

pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
