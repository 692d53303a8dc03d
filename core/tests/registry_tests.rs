// tests/registry_tests.rs
mod common;

use common::*;
use shopflow::{ContextData, Control, Flows, Pipeline, RunOutcome};

#[derive(Clone, Debug, Default)]
struct AlphaContext {
  val: String,
}

#[derive(Clone, Debug, Default)]
struct BetaContext {
  num: i32,
}

#[tokio::test]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let mut alpha = Pipeline::<AlphaContext, TestError>::new(&[("alpha_task", false)]);
  alpha.on("alpha_task", |ctx: ContextData<AlphaContext>| async move {
    ctx.write().val = "alpha_processed".to_string();
    Ok::<_, TestError>(Control::Continue)
  });
  flows.register(alpha);

  let mut beta = Pipeline::<BetaContext, TestError>::new(&[("beta_task", false)]);
  beta.on("beta_task", |ctx: ContextData<BetaContext>| async move {
    ctx.write().num = 100;
    Ok::<_, TestError>(Control::Continue)
  });
  flows.register(beta);

  let alpha_ctx = ContextData::new(AlphaContext::default());
  assert_eq!(flows.run(alpha_ctx.clone()).await, Ok(RunOutcome::Completed));
  assert_eq!(alpha_ctx.read().val, "alpha_processed");

  let beta_ctx = ContextData::new(BetaContext::default());
  assert_eq!(flows.run(beta_ctx.clone()).await, Ok(RunOutcome::Completed));
  assert_eq!(beta_ctx.read().num, 100);
}

#[tokio::test]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let flows = Flows::<TestError>::new();
  assert!(!flows.is_registered::<AlphaContext>());

  match flows.run(ContextData::new(AlphaContext::default())).await {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("NotRegistered"));
      assert!(s.contains("AlphaContext"));
    }
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registry_propagates_pipeline_errors() {
  setup_tracing();
  let flows = Flows::<TestError>::new();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("bad", false)]);
  pipeline.on("bad", create_failing_handler("bad", "broken"));
  flows.register(pipeline);

  let result = flows.run(ContextData::new(TestContext::default())).await;
  assert_eq!(result, Err(TestError::Handler("broken".to_string())));
}

#[tokio::test]
async fn test_registering_again_replaces_pipeline() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let mut first = Pipeline::<TestContext, TestError>::new(&[("s", false)]);
  first.on("s", create_simple_handler("s", "first"));
  flows.register(first);

  let mut second = Pipeline::<TestContext, TestError>::new(&[("s", false)]);
  second.on("s", create_simple_handler("s", "second"));
  flows.register(second);

  let ctx = ContextData::new(TestContext::default());
  flows.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "second");
  assert!(flows.is_registered::<TestContext>());
}
