// core/src/pipeline/definition.rs

use crate::context::Handler;
use crate::error::{FlowError, FlowResult};
use crate::step::{SkipCondition, StepDef};
use std::collections::HashMap;

/// Ordered steps over a context `TData`, with handlers returning `Err`.
pub struct Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from `(name, optional)` pairs, in run order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    Self {
      steps: step_defs
        .iter()
        .map(|(name, optional)| StepDef::new(*name, *optional))
        .collect(),
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn has_step(&self, step_name: &str) -> bool {
    self.position(step_name).is_some()
  }

  fn position(&self, step_name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == step_name)
  }

  fn require_position(&self, step_name: &str) -> FlowResult<usize> {
    self.position(step_name).ok_or_else(|| FlowError::StepNotFound {
      step_name: step_name.to_string(),
    })
  }

  fn insert_at(&mut self, idx: usize, new_step_name: String, optional: bool) -> FlowResult<()> {
    if self.has_step(&new_step_name) {
      return Err(FlowError::DuplicateStep {
        step_name: new_step_name,
      });
    }
    self.steps.insert(idx, StepDef::new(new_step_name, optional));
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, new_step_name: impl Into<String>, optional: bool) -> FlowResult<()> {
    let idx = self.require_position(existing)?;
    self.insert_at(idx, new_step_name.into(), optional)
  }

  pub fn insert_after(&mut self, existing: &str, new_step_name: impl Into<String>, optional: bool) -> FlowResult<()> {
    let idx = self.require_position(existing)?;
    self.insert_at(idx + 1, new_step_name.into(), optional)
  }

  /// Removes a step together with all handlers registered for it.
  pub fn remove_step(&mut self, step_name: &str) -> FlowResult<()> {
    let idx = self.require_position(step_name)?;
    self.steps.remove(idx);
    self.before.remove(step_name);
    self.on.remove(step_name);
    self.after.remove(step_name);
    Ok(())
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.require_position(step_name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn skip_if(
    &mut self,
    step_name: &str,
    condition: impl Fn(&crate::ContextData<TData>) -> bool + Send + Sync + 'static,
  ) -> FlowResult<()> {
    let idx = self.require_position(step_name)?;
    let condition: SkipCondition<TData> = std::sync::Arc::new(condition);
    self.steps[idx].skip_if = Some(condition);
    Ok(())
  }

  pub(crate) fn has_handlers(&self, step_name: &str) -> bool {
    [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).is_some_and(|v| !v.is_empty()))
  }
}
