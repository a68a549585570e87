//! Integration tests for the pipeline runner.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tabkit::pipeline::{
    Pipeline, PipelineConfig, PipelineStatus, StepContext, StepRegistry, StepStatus, step_fn,
};
use tabkit::transform::{Aggregation, TransformOperation, TransformStep};
use tabkit::{Dataset, TabkitError, Value, create_dataset, row};

/// Registry with `ok` (n + 1), `fail` (always errors) and `unreachable` (n * 10).
fn numeric_registry() -> StepRegistry<i64> {
    StepRegistry::new()
        .with_step("ok", step_fn(|n: i64, _ctx| async move { Ok(n + 1) }))
        .with_step(
            "fail",
            step_fn(|_n: i64, _ctx| async move { Err(TabkitError::step("step exploded")) }),
        )
        .with_step("unreachable", step_fn(|n: i64, _ctx| async move { Ok(n * 10) }))
}

fn three_step_pipeline() -> Pipeline {
    Pipeline::new("numbers").with_steps(["ok", "fail", "unreachable"])
}

// =============================================================================
// Failure Policy Tests
// =============================================================================

#[tokio::test]
async fn test_halts_on_failure_by_default() {
    let run = three_step_pipeline().run(&numeric_registry(), 0).await;

    assert_eq!(run.result.status, PipelineStatus::Failed);
    assert_eq!(run.result.steps.len(), 3);
    assert_eq!(run.result.steps[0].status, StepStatus::Completed);
    assert_eq!(run.result.steps[1].status, StepStatus::Failed);
    assert_eq!(run.result.steps[1].error.as_deref(), Some("step exploded"));
    assert_eq!(run.result.steps[2].status, StepStatus::Skipped);
    assert!(run.result.steps[2].started_at.is_none());
    assert!(run.result.steps[2].completed_at.is_none());
    assert_eq!(run.output, 1);
}

#[tokio::test]
async fn test_continue_on_error_treats_failure_as_no_op() {
    let pipeline = three_step_pipeline()
        .with_config(PipelineConfig::new().with_continue_on_error(true));
    let run = pipeline.run(&numeric_registry(), 0).await;

    assert_eq!(run.result.status, PipelineStatus::Partial);
    assert!(!run.result.status.is_success());
    assert_eq!(run.result.steps[1].status, StepStatus::Failed);
    assert_eq!(run.result.steps[2].status, StepStatus::Completed);
    assert_eq!(run.output, 10);
    assert!(run.result.error.is_none());
}

#[tokio::test]
async fn test_missing_step_halts_like_a_failure() {
    let pipeline = Pipeline::new("p").with_steps(["ok", "does_not_exist", "ok"]);
    let run = pipeline.run(&numeric_registry(), 5).await;

    assert_eq!(run.result.status, PipelineStatus::Failed);
    let missing = &run.result.steps[1];
    assert_eq!(missing.status, StepStatus::Failed);
    assert_eq!(
        missing.error.as_deref(),
        Some("Step function not found: does_not_exist")
    );
    assert_eq!(run.result.steps[2].status, StepStatus::Skipped);
    assert_eq!(run.output, 6);
    assert_eq!(
        run.result.error.as_deref(),
        Some("Step function not found: does_not_exist")
    );
}

// =============================================================================
// Retry Tests
// =============================================================================

/// Step that fails until it has been called `succeed_on` times.
fn flaky(calls: Arc<AtomicUsize>, succeed_on: usize) -> impl tabkit::pipeline::StepFunction<i64> {
    step_fn(move |n: i64, _ctx| {
        let calls = Arc::clone(&calls);
        async move {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= succeed_on {
                Ok(n + 100)
            } else {
                Err(TabkitError::step(format!("attempt {} failed", call)))
            }
        }
    })
}

#[tokio::test]
async fn test_retry_succeeds_within_budget() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = StepRegistry::new().with_step("flaky", flaky(Arc::clone(&calls), 3));
    let pipeline = Pipeline::new("retry")
        .with_step("flaky")
        .with_config(PipelineConfig::new().with_retries(3));

    let run = pipeline.run(&registry, 0).await;

    assert_eq!(run.result.status, PipelineStatus::Completed);
    assert!(run.result.status.is_success());
    assert_eq!(run.output, 100);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhausted_records_last_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = StepRegistry::new().with_step("flaky", flaky(Arc::clone(&calls), 100));
    let pipeline = Pipeline::new("retry")
        .with_step("flaky")
        .with_config(PipelineConfig::new().with_retries(2));

    let run = pipeline.run(&registry, 0).await;

    assert_eq!(run.result.status, PipelineStatus::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(run.result.steps[0].error.as_deref(), Some("attempt 3 failed"));
}

#[tokio::test]
async fn test_no_retry_without_flag() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = StepRegistry::new().with_step("flaky", flaky(Arc::clone(&calls), 2));
    let run = Pipeline::new("once").with_step("flaky").run(&registry, 0).await;

    assert_eq!(run.result.status, PipelineStatus::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Context and Logging Tests
// =============================================================================

#[tokio::test]
async fn test_context_and_logs() {
    let registry = StepRegistry::new()
        .with_step(
            "first",
            step_fn(|n: i64, ctx: StepContext| async move {
                ctx.log(format!("{} of {}", ctx.step_index + 1, ctx.total_steps));
                Ok(n)
            }),
        )
        .with_step(
            "second",
            step_fn(|n: i64, ctx: StepContext| async move {
                assert!(ctx.metadata.is_empty());
                ctx.log(format!("pipeline {}", ctx.pipeline_name));
                Ok(n)
            }),
        );
    let run = Pipeline::new("ctx")
        .with_steps(["first", "second"])
        .run(&registry, 0)
        .await;

    assert_eq!(run.result.status, PipelineStatus::Completed);
    let messages: Vec<(&str, &str)> = run
        .logs
        .iter()
        .map(|e| (e.step.as_str(), e.message.as_str()))
        .collect();
    assert_eq!(messages, vec![("first", "1 of 2"), ("second", "pipeline ctx")]);
}

#[tokio::test]
async fn test_timing_is_recorded() {
    let run = Pipeline::new("t").with_step("ok").run(&numeric_registry(), 0).await;
    let result = &run.result;
    assert!(result.completed_at >= result.started_at);
    assert_eq!(
        result.duration_ms,
        (result.completed_at - result.started_at).num_milliseconds()
    );
    let step = &result.steps[0];
    assert!(step.started_at.is_some());
    assert!(step.completed_at >= step.started_at);
}

#[tokio::test]
async fn test_result_serializes_camel_case() {
    let run = three_step_pipeline().run(&numeric_registry(), 0).await;
    let json = serde_json::to_value(&run.result).unwrap();
    assert_eq!(json["pipelineName"], "numbers");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["steps"][2]["status"], "skipped");
    assert!(json["steps"][2].get("startedAt").is_none());
}

// =============================================================================
// Dataset Pipelines
// =============================================================================

#[tokio::test]
async fn test_dataset_pipeline_with_transform_steps() {
    let sales = create_dataset(
        vec![
            row! { "region" => "north", "amount" => 10 },
            row! { "region" => "south", "amount" => Value::Null },
            row! { "region" => "north", "amount" => 30 },
            row! { "region" => "south", "amount" => 5 },
        ],
        "sales",
    );

    let registry: StepRegistry<Dataset> = StepRegistry::new()
        .with_step(
            "clean",
            TransformStep::from(TransformOperation::DropNulls { columns: vec![] }),
        )
        .with_step(
            "summarize",
            TransformStep::from(TransformOperation::Aggregate {
                group_by: "region".to_string(),
                aggregations: [("total".to_string(), Aggregation::sum("amount"))]
                    .into_iter()
                    .collect(),
            }),
        );

    let run = Pipeline::new("sales")
        .with_steps(["clean", "summarize"])
        .run(&registry, sales.clone())
        .await;

    assert_eq!(run.result.status, PipelineStatus::Completed);
    assert_eq!(run.output.row_count(), 2);
    assert_eq!(run.output.rows[0].get("total"), Some(&Value::from(40)));
    assert_eq!(run.output.rows[1].get("total"), Some(&Value::from(5)));
    assert_eq!(run.logs.len(), 2);
    assert_eq!(sales.row_count(), 4);
}

#[tokio::test]
async fn test_invalid_transform_fails_step() {
    let ds = create_dataset(vec![row! { "a" => 1 }], "t");
    let registry = StepRegistry::new().with_step(
        "normalize",
        TransformStep::from(TransformOperation::Normalize {
            column: "missing".to_string(),
        }),
    );
    let run = Pipeline::new("bad")
        .with_step("normalize")
        .run(&registry, ds.clone())
        .await;

    assert_eq!(run.result.status, PipelineStatus::Failed);
    assert_eq!(
        run.result.steps[0].error.as_deref(),
        Some("Column not found: missing")
    );
    assert_eq!(run.output.rows, ds.rows);
}
