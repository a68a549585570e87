//! Sequential pipeline runner with retry and continue-on-error policies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TabkitError};

use super::context::{LogBuffer, LogEntry, StepContext};
use super::function::{StepFunction, StepRegistry};
use super::step::{Step, StepStatus};

/// Execution policy for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Keep going after a step fails, treating the failed step as a no-op.
    pub continue_on_error: bool,
    /// Retry failed steps.
    pub retry_on_failure: bool,
    /// Extra attempts per step when retries are enabled.
    pub max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            retry_on_failure: false,
            max_retries: 3,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set whether to continue after a failed step.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Enable retries with the given number of extra attempts.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry_on_failure = true;
        self.max_retries = max_retries;
        self
    }

    /// Total attempts each step gets under this config.
    pub fn attempts(&self) -> u32 {
        if self.retry_on_failure {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

/// A named, ordered list of step names plus the policy to run them with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name.
    pub name: String,
    /// Step names, resolved against a [`StepRegistry`] at run time.
    pub steps: Vec<String>,
    /// Execution policy.
    #[serde(default)]
    pub config: PipelineConfig,
}

impl Pipeline {
    /// Create an empty pipeline with the default config.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Load a pipeline definition from JSON.
    ///
    /// ```
    /// use tabkit::pipeline::Pipeline;
    ///
    /// let pipeline = Pipeline::from_json(
    ///     r#"{"name": "etl", "steps": ["load", "clean"], "config": {"continueOnError": true}}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(pipeline.steps.len(), 2);
    /// assert!(pipeline.config.continue_on_error);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let pipeline: Pipeline = serde_json::from_str(json)?;
        if pipeline.name.trim().is_empty() {
            return Err(TabkitError::Config("pipeline name must not be empty".to_string()));
        }
        Ok(pipeline)
    }

    /// Append a step.
    pub fn with_step(mut self, name: impl Into<String>) -> Self {
        self.steps.push(name.into());
        self
    }

    /// Append several steps.
    pub fn with_steps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the execution policy.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Check that every step name is registered.
    ///
    /// Running does not require this; unregistered steps are recorded as
    /// failures at run time.
    pub fn validate<T: Send + 'static>(&self, registry: &StepRegistry<T>) -> Result<()> {
        match self.steps.iter().find(|name| !registry.contains(name)) {
            Some(missing) => Err(TabkitError::StepNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Run the pipeline. See [`run_pipeline`].
    pub async fn run<T>(&self, registry: &StepRegistry<T>, input: T) -> PipelineRun<T>
    where
        T: Clone + Send + 'static,
    {
        run_pipeline(self, registry, input).await
    }
}

/// Overall outcome of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Every step completed.
    Completed,
    /// A step failed and the run halted.
    Failed,
    /// At least one step failed but the run continued past it.
    Partial,
}

impl PipelineStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStatus::Completed => "Completed",
            PipelineStatus::Failed => "Failed",
            PipelineStatus::Partial => "Partial",
        }
    }

    /// Check if every step completed.
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineStatus::Completed)
    }
}

/// Record of a finished pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub pipeline_name: String,
    pub status: PipelineStatus,
    /// One record per pipeline step, in pipeline order.
    pub steps: Vec<Step>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    /// Error of the step that halted a failed run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResult {
    /// Steps that ended in failure.
    pub fn failed_steps(&self) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .collect()
    }

    /// First step record with the given name.
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineRun<T> {
    /// Status, timing and per-step records.
    pub result: PipelineResult,
    /// Value after the last step that completed, or the input if none did.
    pub output: T,
    /// Messages logged by steps through [`StepContext::log`].
    pub logs: Vec<LogEntry>,
}

/// Run `pipeline` over `input`, resolving steps from `registry`.
///
/// Steps run strictly one after another. The returned future always
/// resolves; failures are reported through the result's status and step
/// records. A step that fails with `continue_on_error` off halts the run and
/// every later step is recorded as skipped. With `continue_on_error` on, the
/// failed step leaves the running value untouched and the run ends
/// [`PipelineStatus::Partial`].
pub async fn run_pipeline<T>(
    pipeline: &Pipeline,
    registry: &StepRegistry<T>,
    input: T,
) -> PipelineRun<T>
where
    T: Clone + Send + 'static,
{
    let started_at = Utc::now();
    let total_steps = pipeline.steps.len();
    let logs = LogBuffer::new();
    let config = &pipeline.config;

    info!(pipeline = %pipeline.name, steps = total_steps, "Starting pipeline");

    let mut current = input;
    let mut steps = Vec::with_capacity(total_steps);
    let mut status = PipelineStatus::Completed;
    let mut run_error = None;

    for (index, name) in pipeline.steps.iter().enumerate() {
        let mut step = Step::pending(name.as_str());

        let Some(function) = registry.get(name) else {
            let err = TabkitError::StepNotFound(name.clone());
            warn!(pipeline = %pipeline.name, step = %name, "Step function not registered");
            step.fail(err.to_string());
            steps.push(step);
            if config.continue_on_error {
                status = PipelineStatus::Partial;
                continue;
            }
            status = PipelineStatus::Failed;
            run_error = Some(err.to_string());
            break;
        };

        debug!(pipeline = %pipeline.name, step = %name, index, total_steps, "Running step");
        let ctx = StepContext::new(&pipeline.name, name.as_str(), index, total_steps, logs.clone());
        step.start();

        match run_with_retries(function.as_ref(), &current, &ctx, config).await {
            Ok(value) => {
                current = value;
                step.complete();
                steps.push(step);
            }
            Err(err) => {
                let message = err.to_string();
                error!(pipeline = %pipeline.name, step = %name, error = %message, "Step failed");
                step.fail(message.clone());
                steps.push(step);
                if config.continue_on_error {
                    status = PipelineStatus::Partial;
                    continue;
                }
                status = PipelineStatus::Failed;
                run_error = Some(message);
                break;
            }
        }
    }

    if status == PipelineStatus::Failed {
        let reached = steps.len();
        steps.extend(pipeline.steps[reached..].iter().map(Step::skipped));
    }

    let completed_at = Utc::now();
    let duration_ms = (completed_at - started_at).num_milliseconds();
    info!(
        pipeline = %pipeline.name,
        status = status.label(),
        duration_ms,
        "Pipeline finished"
    );

    PipelineRun {
        result: PipelineResult {
            pipeline_name: pipeline.name.clone(),
            status,
            steps,
            started_at,
            completed_at,
            duration_ms,
            error: run_error,
        },
        output: current,
        logs: logs.entries(),
    }
}

/// Run one step, retrying immediately on failure while attempts remain.
async fn run_with_retries<T>(
    function: &dyn StepFunction<T>,
    input: &T,
    ctx: &StepContext,
    config: &PipelineConfig,
) -> Result<T>
where
    T: Clone + Send + 'static,
{
    let attempts = config.attempts();
    let mut attempt = 1;
    loop {
        match function.run(input.clone(), ctx).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    pipeline = %ctx.pipeline_name,
                    step = %ctx.step_name,
                    attempt,
                    attempts,
                    error = %err,
                    "Step attempt failed"
                );
                if attempt >= attempts {
                    return Err(err);
                }
                attempt += 1;
            }
        }
    }
}
