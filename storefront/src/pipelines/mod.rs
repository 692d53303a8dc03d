// storefront/src/pipelines/mod.rs

//! Step pipelines for the multi-step storefront flows, and their registration.

use crate::errors::AppError;
use shopflow::{FlowResult, Flows};

pub mod common_steps;
pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod finalize_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// Registers every pipeline with `flows`. Called once at startup.
pub fn register_all_pipelines(flows: &Flows<AppError>) -> FlowResult<()> {
  tracing::info!("Registering pipelines...");

  signup_pipeline::register_signup_pipeline(flows)?;
  signin_pipeline::register_signin_pipeline(flows)?;
  cart_pipeline::register_add_to_cart_pipeline(flows)?;
  checkout_pipeline::register_create_checkout_pipeline(flows)?;
  finalize_pipeline::register_finalize_checkout_pipeline(flows)?;

  tracing::info!("All pipelines registered.");
  Ok(())
}
