// core/src/lib.rs

//! shopflow: asynchronous step pipelines for multi-step request flows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step carries
//! `before`, `on` and `after` handlers that run against a shared
//! [`ContextData`]. Handlers return [`Control::Continue`] to move on or
//! [`Control::Halt`] to end the run early. Optional steps may fail without
//! failing the run.
//!
//! Pipelines are registered in a [`Flows`] registry keyed by their context
//! type, so a request handler only needs to build a context and call
//! [`Flows::run`].

pub mod context;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::context::{ContextData, Handler};
pub use crate::control::{Control, RunOutcome};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::Pipeline;
pub use crate::registry::Flows;
pub use crate::step::{SkipCondition, StepDef};
