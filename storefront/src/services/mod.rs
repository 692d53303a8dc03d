// storefront/src/services/mod.rs

pub mod auth_service;
pub mod email_mock;
pub mod token_service;
pub mod uploads;
