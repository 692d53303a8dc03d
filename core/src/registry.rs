// core/src/registry.rs

//! `Flows<E>`: pipelines keyed by their context type.

use crate::context::ContextData;
use crate::control::RunOutcome;
use crate::error::FlowError;
use crate::pipeline::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[async_trait]
trait ErasedFlow<AppErr>: Send + Sync {
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, AppErr>;
}

#[async_trait]
impl<TData, PipeErr, AppErr> ErasedFlow<AppErr> for Pipeline<TData, PipeErr>
where
  TData: Send + Sync + 'static,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: From<PipeErr> + From<FlowError> + Send + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, AppErr> {
    let ctx = match ctx.downcast::<ContextData<TData>>() {
      Ok(ctx) => *ctx,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        error!(%expected_type, "Context type mismatch in registry dispatch.");
        return Err(AppErr::from(FlowError::TypeMismatch { expected_type }));
      }
    };
    self.run(ctx).await.map_err(AppErr::from)
  }
}

/// Registry of pipelines, one per context type.
///
/// Registration happens at startup; runs only take the read lock long enough
/// to clone the pipeline handle.
pub struct Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipelines: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<AppErr>>>>,
}

impl<AppErr> Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for contexts of type `TData`, replacing any
  /// pipeline previously registered for that type.
  pub fn register<TData, PipeErr>(&self, pipeline: Pipeline<TData, PipeErr>)
  where
    TData: Send + Sync + 'static,
    PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<PipeErr>,
  {
    let type_name = std::any::type_name::<TData>();
    let replaced = self
      .pipelines
      .write()
      .insert(TypeId::of::<TData>(), Arc::new(pipeline))
      .is_some();
    debug!(context_type = type_name, replaced, "Pipeline registered.");
  }

  pub fn is_registered<TData: Send + Sync + 'static>(&self) -> bool {
    self.pipelines.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  #[instrument(
    name = "Flows::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>()),
    err(Display)
  )]
  pub async fn run<TData: Send + Sync + 'static>(&self, ctx: ContextData<TData>) -> Result<RunOutcome, AppErr> {
    let flow = self.pipelines.read().get(&TypeId::of::<TData>()).cloned();
    let Some(flow) = flow else {
      return Err(AppErr::from(FlowError::NotRegistered {
        type_name: std::any::type_name::<TData>().to_string(),
      }));
    };
    flow.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
