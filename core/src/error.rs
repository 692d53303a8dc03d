// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Step already defined: {step_name}")]
  DuplicateStep { step_name: String },

  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Handler failed in step '{step_name}': {source}")]
  Handler {
    step_name: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Context type mismatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("No pipeline registered for context type {type_name}")]
  NotRegistered { type_name: String },
}

impl FlowError {
  /// Wraps an arbitrary failure raised while running `step_name`.
  pub fn handler(step_name: impl Into<String>, source: impl Into<AnyhowError>) -> Self {
    FlowError::Handler {
      step_name: step_name.into(),
      source: source.into(),
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
