// core/src/control.rs

/// Signal returned by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Keep going: remaining handlers of this step, then the next step.
  Continue,
  /// End the run now. Nothing else executes.
  Halt,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Every step ran (or was skipped) without a halt.
  Completed,
  /// A handler returned [`Control::Halt`].
  Halted,
}

impl RunOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, RunOutcome::Completed)
  }
}
