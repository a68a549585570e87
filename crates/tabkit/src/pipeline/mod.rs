//! Sequential step pipelines.
//!
//! A [`Pipeline`] is an ordered list of step names. At run time each name is
//! resolved against a [`StepRegistry`] and the resulting [`StepFunction`]s are
//! awaited one at a time, threading a value of type `T` from step to step.

mod context;
mod function;
mod runner;
mod step;

pub use context::{LogBuffer, LogEntry, StepContext};
pub use function::{FnStep, StepFunction, StepRegistry, step_fn};
pub use runner::{
    Pipeline, PipelineConfig, PipelineResult, PipelineRun, PipelineStatus, run_pipeline,
};
pub use step::{Step, StepStatus};
