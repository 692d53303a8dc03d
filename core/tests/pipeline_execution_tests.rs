// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use shopflow::{ContextData, Control, Pipeline, RunOutcome};

#[tokio::test]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("step1", false), ("step2", false), ("step3", false)]);
  pipeline.on("step1", create_simple_handler("step1", " S1"));
  pipeline.on("step2", create_simple_handler("step2", " S2"));
  pipeline.on("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(RunOutcome::Completed));
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false)]);
  pipeline.after("only", create_simple_handler("after", "C"));
  pipeline.on("only", create_simple_handler("on", "B"));
  pipeline.before("only", create_simple_handler("before", "A"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "ABC");
  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
async fn test_multiple_handlers_in_one_phase_run_in_registration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false)]);
  pipeline.on("only", create_simple_handler("first", "1"));
  pipeline.on("only", create_simple_handler("second", "2"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "12");
}

#[tokio::test]
async fn test_halt_stops_remaining_handlers_and_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("stepA", false), ("halter", false), ("stepC", false)]);
  pipeline.on("stepA", create_simple_handler("stepA", "A"));
  pipeline.on("halter", |ctx: ContextData<TestContext>| async move {
    ctx.write().steps_executed.push("halter".to_string());
    Ok::<_, TestError>(Control::Halt)
  });
  pipeline.after("halter", create_simple_handler("halter_after", "X"));
  pipeline.on("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(RunOutcome::Halted));
  let guard = ctx.read();
  assert_eq!(guard.message, "A");
  assert_eq!(guard.steps_executed, vec!["stepA", "halter"]);
}

#[tokio::test]
async fn test_halt_from_context_flag() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false), ("b", false)]);
  pipeline.on("a", create_simple_handler("a", "a"));
  pipeline.on("b", create_simple_handler("b", "b"));

  let ctx = ContextData::new(TestContext {
    halt_at: Some("a".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(RunOutcome::Halted));
  assert_eq!(ctx.read().steps_executed, vec!["a"]);
}

#[tokio::test]
async fn test_skip_condition_skips_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false), ("maybe", false), ("last", false)]);
  pipeline.on("first", create_simple_handler("first", "F"));
  pipeline.on("maybe", create_simple_handler("maybe", "M"));
  pipeline.on("last", create_simple_handler("last", "L"));
  pipeline
    .skip_if("maybe", |ctx: &ContextData<TestContext>| ctx.read().counter >= 1)
    .unwrap();

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "FL");
}

#[tokio::test]
async fn test_skip_condition_sees_values_written_by_earlier_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false), ("maybe", false)]);
  pipeline.on("first", create_simple_handler("first", "F"));
  pipeline.on("maybe", create_simple_handler("maybe", "M"));
  pipeline
    .skip_if("maybe", |ctx: &ContextData<TestContext>| ctx.read().counter == 0)
    .unwrap();

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "FM");
}

#[tokio::test]
async fn test_handler_can_await_between_context_accesses() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("io", false)]);
  pipeline.on("io", |ctx: ContextData<TestContext>| async move {
    let start = ctx.read().counter;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    ctx.write().counter = start + 41;
    Ok::<_, TestError>(Control::Continue)
  });

  let ctx = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().counter, 42);
}

#[tokio::test]
async fn test_pipeline_run_is_send_for_spawned_tasks() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("s", false)]);
  pipeline.on("s", create_simple_handler("s", "s"));
  let pipeline = std::sync::Arc::new(pipeline);

  let ctx = ContextData::new(TestContext::default());
  let task_ctx = ctx.clone();
  let task_pipeline = pipeline.clone();
  let outcome = tokio::spawn(async move { task_pipeline.run(task_ctx).await })
    .await
    .unwrap();

  assert_eq!(outcome, Ok(RunOutcome::Completed));
  assert_eq!(ctx.read().message, "s");
}
