//! Runs a small dataset pipeline and prints a summary.
//!
//! ```bash
//! cargo run -p tabkit --example pipeline
//! ```

use tabkit::pipeline::{Pipeline, PipelineConfig, StepContext, StepRegistry, step_fn};
use tabkit::transform::{TransformOperation, TransformStep};
use tabkit::{Dataset, TabkitError, Value, create_dataset, row, stats};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let readings = create_dataset(
        vec![
            row! { "sensor" => "a", "temp" => 21.5 },
            row! { "sensor" => "b", "temp" => Value::Null },
            row! { "sensor" => "a", "temp" => 22.1 },
            row! { "sensor" => "c", "temp" => 35.0 },
            row! { "sensor" => "b", "temp" => 19.8 },
        ],
        "readings",
    );

    let registry: StepRegistry<Dataset> = StepRegistry::new()
        .with_step(
            "clean",
            TransformStep::from(TransformOperation::DropNulls { columns: vec![] }),
        )
        .with_step(
            "check",
            step_fn(|ds: Dataset, ctx: StepContext| async move {
                if ds.row_count() == 0 {
                    return Err(TabkitError::step("no readings left"));
                }
                ctx.log(format!("{} readings", ds.row_count()));
                Ok(ds)
            }),
        )
        .with_step(
            "scale",
            TransformStep::from(TransformOperation::Normalize {
                column: "temp".to_string(),
            }),
        );

    let pipeline = Pipeline::new("sensors")
        .with_steps(["clean", "check", "calibrate", "scale"])
        .with_config(PipelineConfig::new().with_continue_on_error(true));

    let run = pipeline.run(&registry, readings).await;

    println!(
        "{}: {} in {} ms",
        run.result.pipeline_name,
        run.result.status.label(),
        run.result.duration_ms
    );
    if !run.result.status.is_success() {
        println!("  some steps failed; output reflects the steps that completed");
    }
    for step in &run.result.steps {
        match &step.error {
            Some(error) => println!("  {:<10} {} ({})", step.name, step.status.label(), error),
            None => println!("  {:<10} {}", step.name, step.status.label()),
        }
    }
    for entry in &run.logs {
        println!("  [{}] {}", entry.step, entry.message);
    }

    let temp = stats::describe_column(&run.output, "temp");
    println!(
        "temp: count={} mean={:.3} min={:.3} max={:.3}",
        temp.count, temp.mean, temp.min, temp.max
    );
}
