// core/src/pipeline/execution.rs

//! `Pipeline::run`: walks the steps in order and drives their handlers.

use crate::context::{ContextData, Handler};
use crate::control::{Control, RunOutcome};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use crate::step::StepDef;
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Result of driving a single step.
enum StepOutcome {
  Continue,
  Halt,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// A required step that fails ends the run with its error. An optional
  /// step that fails is logged and the run moves on to the next step.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<RunOutcome, Err> {
    debug!("Pipeline run starting.");

    for (step_index, step_def) in self.steps.iter().enumerate() {
      let span = info_span!(
        "step",
        step_name = step_def.name.as_str(),
        step_index,
        optional = step_def.optional
      );
      let outcome = self.run_step(step_def, &ctx_data).instrument(span).await?;
      if let StepOutcome::Halt = outcome {
        info!(step_name = step_def.name.as_str(), "Pipeline halted.");
        return Ok(RunOutcome::Halted);
      }
    }

    debug!("Pipeline run completed.");
    Ok(RunOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<StepOutcome, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_if) = &step_def.skip_if {
      if skip_if(ctx_data) {
        debug!("Step skipped by condition.");
        return Ok(StepOutcome::Continue);
      }
    }

    if !self.has_handlers(step_name) {
      if step_def.optional {
        trace!("Optional step has no handlers.");
        return Ok(StepOutcome::Continue);
      }
      error!("Required step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, table) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
      let Some(handlers) = table.get(step_name) else {
        continue;
      };
      match run_handlers(phase, handlers, ctx_data).await {
        Ok(Control::Continue) => {}
        Ok(Control::Halt) => return Ok(StepOutcome::Halt),
        Err(e) if step_def.optional => {
          warn!(phase, error = %e, "Optional step failed; continuing with next step.");
          return Ok(StepOutcome::Continue);
        }
        Err(e) => {
          error!(phase, error = %e, "Step failed.");
          return Err(e);
        }
      }
    }

    Ok(StepOutcome::Continue)
  }
}

async fn run_handlers<TData, Err>(
  phase: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<Control, Err>
where
  TData: Send + Sync + 'static,
{
  for (handler_index, handler) in handlers.iter().enumerate() {
    trace!(phase, handler_index, "Running handler.");
    if let Control::Halt = handler(ctx_data.clone()).await? {
      return Ok(Control::Halt);
    }
  }
  Ok(Control::Continue)
}
